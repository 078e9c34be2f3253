use anyhow::{Context, Result};
use weathercatch_core::Config;
use weathercatch_ui::{view, AppController, ControllerServices, ControllerSettings};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    weathercatch_core::init()?;

    let (config, _) = Config::load_validated()?;
    let services =
        ControllerServices::from_config(&config).context("Failed to set up dashboard services")?;

    let controller = AppController::new(services, ControllerSettings::from_config(&config));
    let handle = controller.handle();
    let mut state = controller.watch_state();
    let _clock = controller.start_clock();

    handle.initial_load();
    let controller_task = tokio::spawn(controller.run());
    tracing::info!("WeatherCatch started");

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let rendered = view::render(&state.borrow_and_update());
                // Clear the terminal and redraw from the top
                print!("\x1b[2J\x1b[H{}", rendered);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                handle.shutdown();
                break;
            }
        }
    }

    controller_task
        .await
        .context("Controller task failed")?;
    Ok(())
}
