use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use foundation::{GeoBox, ImageFeature};
use layers::HeadlessSurface;
use layers::imagery::{IMAGE_SOURCE_LAYER, IMAGERY_SOURCE_ID};
use layers::query::{summarize_sequences, unique_by_id};
use streaming::{DirectorySink, DownloadOptions, MapillaryClient, SequenceDownloader};
use tools::{parse_bbox, pick_hit, summary_line};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use viewer::{MapSession, SurfaceEvent, ViewerConfig, Viewport};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse and download Mapillary image sequences")]
struct Args {
    /// Mapillary access token (default: MAPILLARY_ACCESS_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Graph API base URL (default: MAPILLARY_GRAPH_URL or the public endpoint)
    #[arg(long)]
    graph_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the sequences with images inside a bbox
    Images {
        /// Bounding box: minLon,minLat,maxLon,maxLat
        #[arg(long)]
        bbox: String,

        /// Only count panoramic images
        #[arg(long)]
        panos_only: bool,

        /// Max number of images to fetch
        #[arg(long, default_value_t = 2000)]
        limit: u32,
    },

    /// Download one sequence as a zip archive
    Download {
        /// Bounding box: minLon,minLat,maxLon,maxLat
        #[arg(long)]
        bbox: String,

        /// Sequence id (see `images`)
        #[arg(long)]
        sequence: String,

        /// Only download panoramic images
        #[arg(long)]
        panos_only: bool,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Pause between images in milliseconds (default: DOWNLOAD_DELAY_MS or 100)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Max number of images to fetch
        #[arg(long, default_value_t = 2000)]
        limit: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = ViewerConfig::from_env();
    if let Some(token) = args.token {
        config = config.with_access_token(token);
    }
    if let Some(graph_url) = args.graph_url {
        config.graph_url = graph_url;
    }
    let Some(token) = config.access_token.clone() else {
        return Err("an access token is required (--token or MAPILLARY_ACCESS_TOKEN)".into());
    };
    let client = MapillaryClient::new(token).with_graph_url(config.graph_url.clone());

    match args.command {
        Command::Images {
            bbox,
            panos_only,
            limit,
        } => {
            let bbox = parse_bbox(&bbox)?;
            let features = search(&client, &bbox, limit).await?;
            let features: Vec<ImageFeature> = features
                .into_iter()
                .filter(|f| !panos_only || f.is_pano)
                .collect();

            println!("sequence\timages\tpanos\tfirst_captured_at\tlast_captured_at");
            for summary in summarize_sequences(&features) {
                println!("{}", summary_line(&summary));
            }
        }
        Command::Download {
            bbox,
            sequence,
            panos_only,
            out,
            delay_ms,
            limit,
        } => {
            if let Some(ms) = delay_ms {
                config.item_delay = Duration::from_millis(ms);
            }
            let bbox = parse_bbox(&bbox)?;
            let features = search(&client, &bbox, limit).await?;
            let Some(hit) = pick_hit(&features, &sequence, panos_only).cloned() else {
                let kind = if panos_only { "panoramas" } else { "images" };
                return Err(format!("sequence {sequence} has no {kind} inside the bbox").into());
            };

            let mut surface = HeadlessSurface::new();
            surface.load_features(IMAGERY_SOURCE_ID, IMAGE_SOURCE_LAYER, features);
            let mut session = MapSession::new(surface, &config)?;
            session.set_viewport(Viewport {
                center: bbox.center(),
                zoom: config.viewport.zoom,
            });
            if panos_only {
                session.dispatch(SurfaceEvent::TogglePanosOnly)?;
            }
            session.dispatch(SurfaceEvent::Click {
                features: vec![hit],
            })?;

            let downloader = SequenceDownloader::new(client).with_options(DownloadOptions {
                item_delay: config.item_delay,
            });
            let mut sink = DirectorySink::new(&out);
            let outcome = session
                .download_selected(&downloader, &mut sink, |p| {
                    eprintln!("{}/{}", p.current, p.total);
                })
                .await?;

            for event in session.drain_events() {
                info!("{:?}: {}", event.kind, event.message);
            }
            match outcome {
                Some(outcome) => {
                    for failure in &outcome.report.failures {
                        warn!("#{} {} skipped: {}", failure.index, failure.image_id, failure.reason);
                    }
                    println!(
                        "{} ({} images, {} skipped)",
                        outcome.path.display(),
                        outcome.report.entries.len(),
                        outcome.report.failures.len()
                    );
                }
                None => println!("nothing to download for sequence {sequence}"),
            }
        }
    }

    Ok(())
}

async fn search(
    client: &MapillaryClient,
    bbox: &GeoBox,
    limit: u32,
) -> Result<Vec<ImageFeature>, Box<dyn std::error::Error>> {
    let features = unique_by_id(client.search_images(bbox, limit).await?);
    info!(
        "{} images inside {}",
        features.len(),
        bbox.to_query_string()
    );
    Ok(features)
}
