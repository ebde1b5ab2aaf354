use clap::{Parser, ValueEnum};
use color_eyre::Result;
use feedpager::app::App;
use feedpager::backend::Watcher;
use feedpager::config::Config;
use feedpager::model::{Layout, MediaFilter};
use feedpager::moderation::LabelModerator;
use feedpager::query::FeedQuery;
use feedpager::source::FixtureSource;
use feedpager::utils::{get_config_dir, initialize_panic_handler};
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, fs};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Media {
    Photos,
    Videos,
}

impl From<Media> for MediaFilter {
    fn from(media: Media) -> Self {
        match media {
            Media::Photos => MediaFilter::Photos,
            Media::Videos => MediaFilter::Videos,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
/// Paginated feed reader.
struct Args {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// JSON document with recorded feed pages to serve.
    #[arg(short, long)]
    fixture: PathBuf,
    /// DID of the signed-in account, required for likes and bookmarks.
    #[arg(short, long)]
    identity: Option<String>,
    /// Show media in two columns.
    #[arg(short, long)]
    grid: bool,
    /// Restrict the grid to one media type.
    #[arg(short, long, value_enum, requires = "grid")]
    media: Option<Media>,
    /// Output width in characters.
    #[arg(short, long, default_value_t = 80)]
    width: usize,
    /// Feed to open: following, @handle[+replies|+media|+video|+threads],
    /// search:terms, search-latest:terms, likes, bookmarks or a feed uri.
    #[arg(default_value = "following")]
    query: FeedQuery,
}

impl Args {
    fn config_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config {
            Ok(path.clone())
        } else {
            Self::default_config_path()
        }
    }
    fn default_config_path() -> Result<PathBuf> {
        let config_dir = get_config_dir()?;
        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join("feedpager.config.toml"))
    }
    fn layout(&self) -> Layout {
        if self.grid {
            Layout::Grid {
                media: self.media.map(MediaFilter::from),
            }
        } else {
            Layout::List
        }
    }
}

fn init_logger() {
    let mut builder = env_logger::Builder::from_default_env();
    if env::var("RUST_LOG").is_err() {
        builder.filter_level(log::LevelFilter::Off);
    }
    builder.init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config_path()?;
    let mut config = if config_path.exists() {
        toml::from_str(&fs::read_to_string(&config_path)?)?
    } else {
        Config::default()
    };
    if let Some(identity) = &args.identity {
        config.identity = Some(identity.clone());
    }
    config.engine.validate()?;

    init_logger();

    initialize_panic_handler()?;

    let source = FixtureSource::from_path(&args.fixture)?;
    let watcher = Watcher::new(
        Arc::new(source),
        Arc::new(LabelModerator::new(&config.moderation)),
        config.identity(),
        config.engine.clone(),
    )
    .with_metrics(config.layout.clone());
    App::new(args.query.clone(), args.layout(), args.width)
        .run(&watcher)
        .await
}
