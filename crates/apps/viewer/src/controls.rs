//! Labels and enabled state of the three session controls.

use runtime::DownloadProgress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub enabled: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub panos_only: Control,
    pub draw_box: Control,
    pub download: Control,
}

impl Controls {
    /// `selected_images` is `None` when no sequence is selected; `progress`
    /// is set while a download runs.
    pub fn compute(
        panos_only: bool,
        drawing_box: bool,
        selected_images: Option<usize>,
        progress: Option<DownloadProgress>,
    ) -> Self {
        Self {
            panos_only: Control {
                label: "Panoramas only".to_string(),
                enabled: progress.is_none(),
                active: panos_only,
            },
            draw_box: Control {
                label: if drawing_box { "Cancel box" } else { "Draw box" }.to_string(),
                enabled: progress.is_none(),
                active: drawing_box,
            },
            download: download_control(selected_images, progress),
        }
    }
}

fn download_control(selected_images: Option<usize>, progress: Option<DownloadProgress>) -> Control {
    if let Some(p) = progress {
        return Control {
            label: format!("Downloading {}/{}", p.current, p.total),
            enabled: false,
            active: true,
        };
    }
    match selected_images {
        Some(n) => Control {
            label: match n {
                1 => "Download 1 image".to_string(),
                n => format!("Download {n} images"),
            },
            enabled: n > 0,
            active: false,
        },
        None => Control {
            label: "Select a sequence".to_string(),
            enabled: false,
            active: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::Controls;
    use runtime::DownloadProgress;

    #[test]
    fn download_label_tracks_count_and_progress() {
        let idle = Controls::compute(false, false, None, None);
        assert!(!idle.download.enabled);

        let selected = Controls::compute(false, false, Some(12), None);
        assert_eq!(selected.download.label, "Download 12 images");
        assert!(selected.download.enabled);

        let empty = Controls::compute(true, false, Some(0), None);
        assert_eq!(empty.download.label, "Download 0 images");
        assert!(!empty.download.enabled);

        let running = Controls::compute(
            false,
            false,
            Some(12),
            Some(DownloadProgress { current: 3, total: 12 }),
        );
        assert_eq!(running.download.label, "Downloading 3/12");
        assert!(!running.download.enabled);
        assert!(!running.draw_box.enabled);
    }

    #[test]
    fn draw_toggle_label_flips() {
        assert_eq!(Controls::compute(false, true, None, None).draw_box.label, "Cancel box");
        assert_eq!(Controls::compute(false, false, None, None).draw_box.label, "Draw box");
        assert!(Controls::compute(true, false, None, None).panos_only.active);
    }
}
