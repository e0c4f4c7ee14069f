use portfolio_dashboard::{
    Dashboard, GuardDecision, ListScope, Notifier, Resource, ResourceKind,
    config::{AppConfig, Env},
    models::{Blog, LoginRequest, Message, Project, User},
    routes::{self, PanelRoute},
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Headless dashboard run: loads configuration, starts logging, resolves the session,
/// passes it through the route guard and loads the first page of every panel the
/// resulting layout can reach.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration (fail fast on an incomplete production setup)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("FATAL: {err}");
            return ExitCode::FAILURE;
        }
    };

    // 2. Logging: pretty for local runs, JSON for log aggregation in production.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portfolio_dashboard=debug,reqwest=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!(api_url = %config.api_url, "dashboard starting in {:?} mode", config.env);

    // 3. Context assembly
    let credentials = config.credentials.clone();
    let dashboard = match Dashboard::connect(config, Notifier::silent()) {
        Ok(dashboard) => dashboard,
        Err(err) => {
            tracing::error!(error = %err, "could not build the HTTP client");
            return ExitCode::FAILURE;
        }
    };

    // 4. Session bootstrap, then an optional sign-in when the visitor is anonymous.
    let session = dashboard.start().await;
    if !session.is_authenticated {
        if let Some((email, password)) = credentials {
            let _ = dashboard
                .session()
                .login(&LoginRequest { email, password })
                .await;
        }
    }

    // 5. Route guard
    let mut guard = dashboard.route_guard();
    let mut sessions = dashboard.session().subscribe();
    match guard.resolve(&mut sessions).await {
        GuardDecision::Granted { layout, user } => {
            tracing::info!(user = %user.name, shell = ?layout.shell, home = layout.home(), "access granted");
            for link in layout.links {
                tracing::info!(name = link.name, path = link.path, "sidebar link");
            }
            for panel in layout.panels() {
                preview(&dashboard, panel).await;
            }
        }
        GuardDecision::Redirect { to } => {
            tracing::info!(to = %to, "not signed in; dashboard redirects to login");
            let projects = dashboard
                .panel_with_limit::<Project>(ListScope::All, routes::public::PROJECTS_PAGE_LIMIT);
            if projects.list(1).await.is_ok() {
                tracing::info!(
                    shown = projects.items().len(),
                    total_pages = projects.pagination().total_pages,
                    "public projects page"
                );
            }
        }
        other => tracing::warn!(decision = ?other, "session did not resolve"),
    }

    // 6. Teardown
    dashboard.shutdown();
    ExitCode::SUCCESS
}

async fn preview(dashboard: &Dashboard, route: PanelRoute) {
    match route.kind {
        ResourceKind::Blog => preview_panel::<Blog>(dashboard, route.scope).await,
        ResourceKind::Project => preview_panel::<Project>(dashboard, route.scope).await,
        ResourceKind::Message => preview_panel::<Message>(dashboard, route.scope).await,
        ResourceKind::User => preview_panel::<User>(dashboard, route.scope).await,
    }
}

async fn preview_panel<R: Resource>(dashboard: &Dashboard, scope: ListScope) {
    let panel = dashboard.panel::<R>(scope);
    if panel.list(1).await.is_ok() {
        let pagination = panel.pagination();
        tracing::info!(
            kind = ?R::KIND,
            shown = panel.items().len(),
            page = pagination.page,
            total_pages = pagination.total_pages,
            "panel loaded"
        );
    }
}
