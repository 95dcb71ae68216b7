use std::env::args;
use std::sync::Arc;

use anyhow::Result;
use fanbase::config::{parse_from, Config, Mode, Store};
use fanbase::controllers::router;
use fanbase::seed::Seed;
use fanbase::usecases::reconcile::reconcile;
use fanbase::{in_memory, mongo, App};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

async fn build_app(config: &Config) -> Result<App> {
    match config.store {
        Store::Memory => {
            info!("using in-memory store");
            let (app, repos) = in_memory(config.limits);

            match config.seed {
                Some(ref path) => {
                    let report = Seed::load(path).await?.apply(&app, &repos).await?;
                    info!(
                        "seeded {} user(s), {} follow(s) and {} post(s) from {}",
                        report.users,
                        report.follows,
                        report.posts,
                        path.display()
                    );
                },
                None => warn!("in-memory store is empty, every token is rejected until seeded (--seed)"),
            }

            Ok(app)
        },
        Store::Mongo { ref uri, ref db } => {
            info!("connecting to mongodb (db: {})", db);
            mongo(uri, db, config.limits).await
        },
    }
}

async fn serve(config: Config, app: App) -> Result<()> {
    let listener = TcpListener::bind(config.bind).await?;
    info!("listening on {}", config.bind);

    axum::serve(listener, router(Arc::new(app)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

async fn run_reconcile(app: App, input: reconcile::Input) -> Result<()> {
    let out = app.reconcile.handle(input).await?;

    let drifted_users = out.users.iter().filter(|d| d.drifted()).count();
    let drifted_posts = out.posts.iter().filter(|d| d.drifted()).count();
    info!(
        "reconciled {} user(s) ({} drifted) and {} post(s) ({} drifted)",
        out.users.len(),
        drifted_users,
        out.posts.len(),
        drifted_posts
    );

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("received ctrl-c, shutting down"),
            Err(e) => error!("cannot listen for ctrl-c: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
                info!("received terminate signal, shutting down");
            },
            Err(e) => {
                error!("cannot install terminate handler: {}", e);
                ::std::future::pending::<()>().await
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = ::std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn async_main(config: Config, mode: Mode) -> Result<()> {
    let app = build_app(&config).await?;

    match mode {
        Mode::Serve => serve(config, app).await,
        Mode::Reconcile { users, posts } => {
            run_reconcile(app, reconcile::Input { users, posts }).await
        },
    }
}

fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let (config, mode) = match parse_from(args()) {
        Ok(o) => o,
        Err(e) => match e.downcast::<clap::Error>() {
            Ok(e) => e.exit(),
            Err(e) => {
                eprintln!("invalid configuration: {:#}", e);
                ::std::process::exit(2)
            },
        },
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("fanbase-worker")
        .build()
    {
        Ok(r) => r,
        Err(e) => return eprintln!("{}", e),
    };

    if let Err(e) = rt.block_on(async_main(config, mode)) {
        error!("{:#}", e);
        ::std::process::exit(1);
    }
}
