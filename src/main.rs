use anyhow::Result;
use base64::Engine as _;
use clap::{Args, Parser, Subcommand};
use genai_gateway::ai::Gateway;
use genai_gateway::hosting::{ImageHost, ImgBbClient};
use genai_gateway::mime::ImageFormat;
use genai_gateway::models::{Config, GenerateInput, ModelSettings, OutputModality};
use genai_gateway::router;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "genai-gateway")]
#[command(about = "Route prompts to Gemini and Imagen models")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the routing descriptor for a model id.
    Resolve {
        #[arg(value_name = "MODEL")]
        model: String,
    },
    /// List every model id the router knows, with its capability and provider.
    Models,
    /// Run one generation request.
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(long)]
    model: String,
    #[arg(long)]
    prompt: String,
    #[arg(long)]
    system: Option<String>,
    #[arg(long)]
    temperature: Option<f64>,
    #[arg(long)]
    top_p: Option<f64>,
    #[arg(long)]
    max_output_tokens: Option<u32>,
    /// TEXT, IMAGE or TEXT_AND_IMAGE.
    #[arg(long, value_parser = parse_modality)]
    modality: Option<OutputModality>,
    #[arg(long)]
    aspect_ratio: Option<String>,
    #[arg(long)]
    sample_count: Option<u32>,
    /// Where to write a generated image. The extension follows the image format.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Upload a generated image to ImgBB (needs IMGBB_API_KEY).
    #[arg(long)]
    upload: bool,
}

impl GenerateArgs {
    fn to_input(&self) -> GenerateInput {
        GenerateInput::new(&self.model, &self.prompt).with_settings(ModelSettings {
            system_instruction: self.system.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
            output_modality: self.modality,
            aspect_ratio: self.aspect_ratio.clone(),
            sample_count: self.sample_count,
        })
    }
}

fn parse_modality(input: &str) -> std::result::Result<OutputModality, String> {
    input.parse()
}

/// Decode the image and write it next to `output` (or `generated.<ext>`).
fn write_image(image_base64: &str, output: Option<&Path>) -> Result<PathBuf> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(image_base64)?;
    let format = ImageFormat::sniff(&bytes);
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("generated"))
        .with_extension(format.extension());
    std::fs::write(&path, &bytes)?;
    info!(
        "Saved {} ({} bytes) to {}",
        format.mime_type(),
        bytes.len(),
        path.display()
    );
    Ok(path)
}

/// One line per routable model: id, capability class, provider.
fn model_listing() -> Vec<String> {
    router::known_models()
        .map(|id| {
            let descriptor = router::resolve(id);
            format!(
                "{}\t{}\t{:?}",
                descriptor.model_id, descriptor.capability, descriptor.provider
            )
        })
        .collect()
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let config = Config::from_env()?;
    let gateway = Gateway::from_config(&config)?;

    let result = gateway.generate(&args.to_input()).await?;

    if let Some(text) = &result.text {
        println!("{}", text);
    }

    if let Some(image) = &result.image_base64 {
        let path = write_image(image, args.output.as_deref())?;
        println!("{}", path.display());

        if args.upload {
            let api_key = config
                .imgbb_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--upload requires IMGBB_API_KEY"))?;
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("generated");
            let url = ImgBbClient::new(api_key).upload(image, name).await?;
            println!("{}", url);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "genai_gateway=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let outcome = match args.command {
        Command::Resolve { model } => {
            let descriptor = router::resolve(&model);
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
            Ok(())
        }
        Command::Models => {
            for line in model_listing() {
                println!("{}", line);
            }
            Ok(())
        }
        Command::Generate(generate_args) => generate(generate_args).await,
    };

    if let Err(e) = outcome {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
