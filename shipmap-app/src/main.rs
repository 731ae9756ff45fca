use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use shipmap::prelude::*;

/// Headless vessel map runner that logs what the sync engine renders
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Base URL of the vessel position API
    api_url: Option<String>,

    /// JSON file holding the device-local settings
    #[clap(long, default_value = "shipmap-settings.json")]
    store: PathBuf,

    /// MMSI of a vessel to select at start
    #[clap(long)]
    select: Option<String>,

    /// Initial view as LAT,LON[,ZOOM]
    #[clap(long, value_parser = parse_center)]
    center: Option<ViewState>,
}

fn parse_center(value: &str) -> Result<ViewState> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("invalid center {value}"))?;
    match parts.as_slice() {
        [lat, lon, zoom] => Ok(ViewState::new(*lat, *lon, *zoom)),
        [lat, lon] => Ok(ViewState::new(*lat, *lon, 10.0)),
        _ => bail!("expected LAT,LON[,ZOOM], got {value}"),
    }
}

fn summarize(composition: &Composition) {
    let layers: Vec<String> = composition
        .layers
        .iter()
        .filter_map(|layer| match layer {
            LayerDescriptor::VesselIcons(icons) if !icons.data.is_empty() => {
                Some(format!("{}={}", icons.category, icons.data.len()))
            }
            _ => None,
        })
        .collect();
    log::info!(
        "composition #{}: {} layers, {} vessels [{}]",
        composition.revision,
        composition.layers.len(),
        composition.vessel_count(),
        layers.join(", ")
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut builder = SyncEngineBuilder::new()
        .with_local_store(Arc::new(FileStore::new(&args.store)))
        .with_viewport_size(1280.0, 800.0);
    if let Some(url) = &args.api_url {
        builder = builder.with_base_url(url.clone());
    }
    if let Some(mmsi) = &args.select {
        builder = builder.with_link(ShareableLink::default().with_selected_vessel(Some(mmsi.as_str())).to_string());
    }
    let engine = builder.build().await.context("failed to start sync engine")?;
    log::info!(
        "feed {} | settings {}",
        engine.options().feed.base_url,
        args.store.display()
    );

    if let Some(center) = args.center {
        engine.on_view_state_change(center);
    }

    let events = engine.events();
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    let mut last_revision = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted");
                break;
            }
            _ = ticker.tick() => {
                for event in events.try_iter() {
                    match event {
                        EngineEvent::CategoryFailed { category, error } => {
                            log::warn!("{} failed: {}", category, error);
                        }
                        EngineEvent::SelectionChanged(state) => match &state.entity {
                            Some(vessel) => log::info!(
                                "selected {} ({}) at {:?}",
                                vessel.mmsi,
                                vessel.ship_name,
                                vessel.position()
                            ),
                            None if state.panel_open => log::info!(
                                "looking up vessel {}",
                                state.external_id.as_deref().unwrap_or_default()
                            ),
                            None => log::info!("selection cleared"),
                        },
                        other => log::debug!("{:?}", other),
                    }
                }

                let composition = engine.compose();
                if composition.revision != last_revision {
                    last_revision = composition.revision;
                    summarize(&composition);
                }
            }
        }
    }

    engine.shutdown();
    log::info!("link on exit: {}", engine.link());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_select_and_center() {
        let args = Args::try_parse_from([
            "shipmap-app",
            "https://ais.example.org/api",
            "--store",
            "/tmp/settings.json",
            "--select",
            "244660000",
            "--center",
            "51.9, 4.5, 9",
        ])
        .unwrap();
        assert_eq!(args.api_url.as_deref(), Some("https://ais.example.org/api"));
        assert_eq!(args.store, PathBuf::from("/tmp/settings.json"));
        assert_eq!(args.select.as_deref(), Some("244660000"));
        assert_eq!(args.center, Some(ViewState::new(51.9, 4.5, 9.0)));
    }

    #[test]
    fn defaults_and_bad_values() {
        let args = Args::try_parse_from(["shipmap-app"]).unwrap();
        assert_eq!(args.store, PathBuf::from("shipmap-settings.json"));
        assert!(args.api_url.is_none() && args.center.is_none());

        assert!(Args::try_parse_from(["shipmap-app", "--store"]).is_err());
        assert!(Args::try_parse_from(["shipmap-app", "--center", "north,4.5"]).is_err());
        assert_eq!(
            parse_center("51.9,4.5").unwrap(),
            ViewState::new(51.9, 4.5, 10.0)
        );
    }
}
