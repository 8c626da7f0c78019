use anyhow::Context;
use clap::Parser;
use generator::profile::{GeneratorConfig, SyntheticPointSource};
use gui_bridge::bridge::GuiBridge;
use source::HttpPointSource;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::sync::watch;
use vigilcore::detection::PointSource;
use vigilcore::tile::{TilePoller, TileRegistry};
use workflow::config::DashboardConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod source;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Vigil overlay dashboard driver")]
struct Args {
    /// Render a single offline pass for every camera and emit a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a dashboard config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 4)]
    cameras: usize,
    #[arg(long, default_value_t = 7)]
    window_days: u32,
    #[arg(long, default_value_t = 640)]
    viewport_width: u32,
    #[arg(long, default_value_t = 360)]
    viewport_height: u32,
    /// Fetch detections from a live detection API instead of the synthetic
    /// generator
    #[arg(long)]
    source_url: Option<String>,
    /// Keep the bridge and per-camera pollers alive
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let dashboard_config = if let Some(path) = args.config {
        DashboardConfig::load(path)?
    } else {
        DashboardConfig::from_args(
            args.cameras,
            args.window_days,
            args.viewport_width,
            args.viewport_height,
        )
    };

    let registry = Arc::new(RwLock::new(TileRegistry::new(
        dashboard_config.to_overlay_config(),
    )));
    let (settings_tx, settings_rx) = watch::channel(dashboard_config.query_settings());
    let gui_bridge = GuiBridge::new(registry.clone(), settings_tx, dashboard_config.clone());

    if args.offline {
        let runner = Runner::new(dashboard_config.clone());
        let reports = runner.execute(&registry)?;

        for report in &reports {
            println!(
                "Offline overlay -> camera {} ({}): {} detections, peak {:.2}, {} hot cells",
                report.camera_id,
                report.camera_name,
                report.total_detections,
                report.peak_value,
                report.painted_cells
            );
        }
        gui_bridge.publish_status("Offline overlay results ready.");

        let mut summary = String::new();
        for report in &reports {
            summary.push_str(&format!(
                "camera={} detections={} peak={:.3} hot_cells={} classes={:?}\n",
                report.camera_id,
                report.total_detections,
                report.peak_value,
                report.painted_cells,
                report.class_counts
            ));
        }
        let report_path = PathBuf::from("tools/data/offline_overlay.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)?;
        file.write_all(summary.as_bytes())?;
    }

    if args.serve {
        gui_bridge.publish_status("Bridge and per-camera pollers running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for tile pollers")?;
        runtime.block_on(async {
            let synthetic = SyntheticPointSource::new(GeneratorConfig::default());
            for camera in &dashboard_config.cameras {
                if !camera.online {
                    synthetic.fail_camera(&camera.id);
                }
            }
            let point_source: Arc<dyn PointSource> = match args.source_url.as_deref() {
                Some(url) => Arc::new(HttpPointSource::new(url)),
                None => Arc::new(synthetic),
            };
            let refresh_interval =
                Duration::from_millis(dashboard_config.refresh_interval_ms.max(1));

            let mut pollers = Vec::with_capacity(dashboard_config.cameras.len());
            for camera in &dashboard_config.cameras {
                {
                    let mut guard = registry
                        .write()
                        .map_err(|_| anyhow::anyhow!("tile registry lock poisoned"))?;
                    let tile = guard.ensure(&camera.id);
                    tile.resize(
                        dashboard_config.viewport_width,
                        dashboard_config.viewport_height,
                    );
                    tile.set_online(camera.online);
                }
                pollers.push(TilePoller::spawn(
                    camera.id.clone(),
                    point_source.clone(),
                    registry.clone(),
                    settings_rx.clone(),
                    refresh_interval,
                ));
            }

            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            for poller in &pollers {
                poller.shutdown();
            }
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
