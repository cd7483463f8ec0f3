use anyhow::{Context, Result};
use clap::Parser;
use debugattor::config::{self, Config};
use debugattor::{ImageInput, Loggable, PixelArray, PixelData, Tracker, api::ApiClient, logging};

const DEMO_WIDTH: u32 = 80;
const DEMO_HEIGHT: u32 = 50;

#[derive(Parser)]
#[command(
    name = "debugattor-demo",
    about = "Record a sample execution against a Debugattor server"
)]
struct Cli {
    /// Base URL of the API, overriding DEBUGATTOR_API_URL.
    #[arg(long)]
    api_url: Option<String>,
    /// Request timeout in seconds, overriding DEBUGATTOR_TIMEOUT_SECS.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Step names to register, in order.
    #[arg(
        long = "steps",
        num_args = 1..,
        default_values_t = [
            "loading images".to_string(),
            "processing data".to_string(),
            "detecting circles".to_string(),
        ]
    )]
    steps: Vec<String>,
}

#[derive(Debug)]
struct Circle {
    x: u32,
    y: u32,
    radius: u32,
}

impl Loggable for Circle {
    fn attribute(&self, name: &str) -> Option<&dyn Loggable> {
        match name {
            "x" => Some(&self.x as &dyn Loggable),
            "y" => Some(&self.y as &dyn Loggable),
            "radius" => Some(&self.radius as &dyn Loggable),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct StepReport {
    step: String,
    status: &'static str,
    circles: Vec<Circle>,
}

impl Loggable for StepReport {
    fn record(&self) -> Option<Vec<(&str, &dyn Loggable)>> {
        Some(vec![
            ("step", &self.step as &dyn Loggable),
            ("status", &self.status as &dyn Loggable),
            ("circles", &self.circles as &dyn Loggable),
        ])
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let mut settings = Config::from_env().context("failed to load configuration")?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(timeout_secs) = cli.timeout_secs.filter(|secs| *secs > 0) {
        settings.timeout_secs = timeout_secs;
    }
    let settings = config::install_config(settings).context("failed to install configuration")?;
    logging::init_tracing();

    let client = ApiClient::new(&settings.api_url, settings.timeout())
        .context("failed to build the API client")?;
    tracing::info!(api_url = client.base_url(), "Starting demo execution");
    let tracker = Tracker::with_client(client);

    let execution_id = tracker
        .start_execution()
        .await
        .context("the server did not start an execution")?;

    for (index, name) in cli.steps.iter().enumerate() {
        let Some(step_id) = tracker.add_step(&execution_id, name).await else {
            tracing::warn!(step = %name, "Skipping step that could not be registered");
            continue;
        };

        if index == 0 {
            let image = demo_image().context("failed to build the demo image")?;
            tracker
                .log_image_artifact(
                    &execution_id,
                    &step_id,
                    image,
                    "Demo image with a cyan rectangle",
                    None,
                )
                .await;
            tracker
                .log_text_artifact(&execution_id, &step_id, "Demo image generated successfully")
                .await;

            let report = StepReport {
                step: name.clone(),
                status: "success",
                circles: vec![Circle {
                    x: DEMO_WIDTH / 2,
                    y: DEMO_HEIGHT / 2,
                    radius: 15,
                }],
            };
            tracker
                .log_json_artifact(&execution_id, &step_id, &report)
                .await;
        }

        tracker
            .log_text_artifact(&execution_id, &step_id, &format!("Finished {name}"))
            .await;
        tracker.complete_step(&execution_id, &step_id).await;
    }

    tracker.complete_execution(&execution_id).await;
    tracing::info!(%execution_id, "Demo execution recorded");
    Ok(())
}

/// 80×50 BGR array with a cyan rectangle over rows 10..40 and columns 20..60.
fn demo_image() -> Result<ImageInput> {
    let channels = 3;
    let mut data = vec![0_u8; (DEMO_WIDTH * DEMO_HEIGHT) as usize * channels];
    for row in 10..40 {
        for col in 20..60 {
            let offset = (row * DEMO_WIDTH as usize + col) * channels;
            data[offset..offset + channels].copy_from_slice(&[255, 255, 0]);
        }
    }
    let array = PixelArray::new(DEMO_HEIGHT, DEMO_WIDTH, 3, PixelData::U8(data))?;
    Ok(array.into())
}
