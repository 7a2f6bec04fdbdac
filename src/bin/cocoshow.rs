use anyhow::{bail, Context, Result};
use clap::Parser;
use cocotool::drawing::{draw_image_record_to_file, DrawOptions, Shape};
use cocotool::{AnnotationStore, Split, StoreConfig};
use itertools::Itertools;
use log::info;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(about = "Draw the annotations of a COCO image")]
struct Args {
    /// json5 file with the dataset root and file name padding
    #[arg(long)]
    config: Option<PathBuf>,
    /// dataset folder, overrides the config file
    #[arg(long)]
    root: Option<PathBuf>,
    #[arg(long)]
    id: Option<u64>,
    #[arg(long, default_value = "train")]
    split: Split,
    /// looked up in train, then val
    #[arg(long, conflicts_with = "id")]
    file_name: Option<String>,
    #[arg(long, default_value_t = 2000.)]
    min_area: f64,
    /// draw boxes instead of segmentation polygons
    #[arg(long)]
    bbox: bool,
    /// draw only this instance
    #[arg(long)]
    instance: Option<usize>,
    #[arg(long)]
    caption: bool,
    #[arg(long, default_value = "out.png")]
    out: PathBuf,
    /// print the category and supercategory names and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => StoreConfig::open(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        None => StoreConfig::new("."),
    };
    if let Some(root) = args.root {
        config.root = root;
    }
    let store = AnnotationStore::new(config);

    if args.list_categories {
        println!("{}", store.list_category_names()?.join(", "));
        println!(
            "{}",
            store.list_super_category_names()?.iter().sorted().join(", ")
        );
        return Ok(());
    }

    let record = match (args.id, &args.file_name) {
        (Some(id), _) => store
            .get_image_record(id, args.split)
            .with_context(|| format!("failed to load image {} of {}", id, args.split))?,
        (None, Some(file_name)) => match store.get_image_record_by_file_name(file_name)? {
            Some(record) => record,
            None => bail!("image '{}' is in neither train nor val", file_name),
        },
        (None, None) => bail!("either --id or --file-name is required"),
    };

    let options = DrawOptions {
        min_area: args.min_area,
        shape: if args.bbox {
            Shape::BoundingBox
        } else {
            Shape::Segmentation
        },
        instance: args.instance,
        show_caption: args.caption,
        ..Default::default()
    };
    let rendering = draw_image_record_to_file(&record, &options, &args.out)
        .with_context(|| format!("failed to save '{}'", args.out.display()))?;

    if let Some(title) = &rendering.title {
        println!("{}", title);
    }
    for entry in &rendering.legend {
        let [r, g, b, _] = entry.color.0;
        println!("#{:02x}{:02x}{:02x} {}", r, g, b, entry.label);
    }
    info!(
        "{} instances of image {} drawn to {}",
        rendering.legend.len(),
        record.image.file_name,
        args.out.display()
    );
    Ok(())
}
