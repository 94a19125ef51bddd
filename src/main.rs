use clap::Parser;
use contactdesk::cli::{run_delete, run_import, run_list, run_show, run_update, Cli, Commands};
use contactdesk::config::{AppConfig, DEFAULT_LOG_FILTER};
use contactdesk::db::{ContactRepository, Database, MemoryContactRepository, SqliteContactRepository};
use contactdesk::ContactService;
use env_logger::Env;
use tokio_util::sync::CancellationToken;

async fn dispatch<R: ContactRepository>(
    service: &ContactService<R>,
    command: Commands,
    max_upload_bytes: u64,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Commands::List(args) => run_list(service, &args, cancel).await,
        Commands::Show(args) => run_show(service, &args.id, args.json, cancel).await,
        Commands::Update(args) => run_update(service, &args, cancel).await,
        Commands::Delete(args) => run_delete(service, &args.id, args.force, cancel).await,
        Commands::Import(args) => run_import(service, &args, max_upload_bytes, cancel).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_LOG_FILTER)).init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let max_upload_bytes = config.max_upload_bytes();

    // Ctrl-C cancels the running operation; staged changes are discarded
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())?;
    }

    let dry_run = matches!(&cli.command, Commands::Import(args) if args.dry_run);
    if cli.memory || dry_run {
        log::debug!("Using in-memory contacts");
        let service = ContactService::new(MemoryContactRepository::new());
        return dispatch(&service, cli.command, max_upload_bytes, &cancel).await;
    }

    let db_path = cli.db.unwrap_or(config.database_path);
    log::debug!("Using database {}", db_path.display());

    let service = ContactService::new(SqliteContactRepository::new(Database::open_at(db_path)?));
    dispatch(&service, cli.command, max_upload_bytes, &cancel).await
}
