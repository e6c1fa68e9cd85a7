use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use headshot::capture::{PhotoFile, PhotoSource};
use headshot::segmentation::{self, MaskImage, Preprocessor, SegmentationModel, TensorLayout};
use headshot::{
    process_in_background, wait_for, DirectorySink, HeadshotPipeline, OutputFormat, RecordStore,
    SqliteRecordStore,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("segmenter").required(true).args(["model", "mask"])))]
struct Args {
    /// Photo to process
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Take the photo from this camera index instead of a file
    #[cfg(feature = "webcam")]
    #[arg(long, conflicts_with = "input")]
    camera: Option<u32>,

    /// Path to selfie segmentation model (ONNX file)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Square input resolution of the model
    #[arg(long, default_value_t = 256)]
    model_size: u32,

    /// Input tensor layout of the model
    #[arg(long, value_enum, default_value_t = TensorLayout::Nchw)]
    layout: TensorLayout,

    /// Precomputed grayscale mask to use instead of a model
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Directory for processed images
    #[arg(short, long, default_value = "processed")]
    output_dir: PathBuf,

    /// Encoding of processed images
    #[arg(long, value_enum, default_value_t = OutputFormat::Jpeg)]
    format: OutputFormat,

    /// Also write the mask as a grayscale image
    #[arg(long)]
    save_mask: Option<PathBuf>,

    /// Name to record with the headshot
    #[arg(long, requires = "phone")]
    name: Option<String>,

    /// Phone number to record with the headshot
    #[arg(long, requires = "name")]
    phone: Option<String>,

    /// Record database (default: records.db in the output directory)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Print every saved record when done
    #[arg(long)]
    list: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Headshot starting");

    let photo = open_source(&args)?
        .capture()
        .context("Failed to take photo")?;

    let model = load_model(&args)?;

    let sink = DirectorySink::new(&args.output_dir).context("Failed to open output directory")?;
    let pipeline = Arc::new(Mutex::new(HeadshotPipeline::new(model, sink, args.format)));

    let headshot = wait_for(process_in_background(pipeline, photo))
        .await
        .context("Failed to process photo")?;

    println!("{}", headshot.reference);

    if let Some(path) = &args.save_mask {
        Preprocessor::mask_to_gray(&headshot.mask)
            .save(path)
            .with_context(|| format!("Failed to save mask to {}", path.display()))?;
        tracing::info!("Mask written to {}", path.display());
    }

    if args.name.is_none() && !args.list {
        return Ok(());
    }

    let db_file = args
        .database
        .clone()
        .unwrap_or_else(|| args.output_dir.join("records.db"));
    let records = SqliteRecordStore::open(&db_file)
        .await
        .context("Failed to open record database")?;

    if let (Some(name), Some(phone)) = (&args.name, &args.phone) {
        let record = headshot
            .confirm(&records, name, phone)
            .await
            .context("Failed to save record")?;
        println!("{}\t{}\t{}\t{}", record.id, record.name, record.phone, record.image_ref);
    }

    if args.list {
        for record in records.list().await.context("Failed to list records")? {
            println!("{}\t{}\t{}\t{}", record.id, record.name, record.phone, record.image_ref);
        }
    }

    records.close().await;
    Ok(())
}

fn open_source(args: &Args) -> Result<Box<dyn PhotoSource>> {
    if let Some(camera) = open_camera(args)? {
        return Ok(camera);
    }

    match &args.input {
        Some(path) => Ok(Box::new(PhotoFile::new(path))),
        None => bail!("No photo given, pass --input"),
    }
}

#[cfg(feature = "webcam")]
fn open_camera(args: &Args) -> Result<Option<Box<dyn PhotoSource>>> {
    let Some(index) = args.camera else {
        return Ok(None);
    };
    let camera = headshot::capture::WebcamCapture::new(index)
        .context("Failed to initialize camera")?;
    Ok(Some(Box::new(camera)))
}

#[cfg(not(feature = "webcam"))]
fn open_camera(_args: &Args) -> Result<Option<Box<dyn PhotoSource>>> {
    Ok(None)
}

fn load_model(args: &Args) -> Result<Box<dyn SegmentationModel + Send>> {
    if let Some(model_path) = &args.model {
        tracing::info!("Loading segmentation model from {}", model_path.display());
        let model = segmentation::create_default_model(model_path, args.model_size, args.layout)
            .context("Failed to load segmentation model")?;
        tracing::info!("Segmentation model loaded successfully");
        return Ok(model);
    }

    match &args.mask {
        Some(mask_path) => Ok(Box::new(
            MaskImage::open(mask_path).context("Failed to load mask")?,
        )),
        None => bail!("Either --model or --mask is required"),
    }
}
