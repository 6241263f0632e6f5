#![cfg(not(tarpaulin_include))]

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::Query;
use chrono::Utc;
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;

use crate::access::{self, Access};
use crate::config::Config;
use crate::dashboard::{apply_update, FilterOptions, Kpis, OrderFilter, OrderUpdate};
use crate::downloader;
use crate::error::{DashboardError, Result};
use crate::faq::FAQ;
use crate::order::{Order, OrderStatus, ORDER_COLUMNS};
use crate::store::RecordStore;
use crate::tokens::{ttl_from_hours, Role, TokenRegistry};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Shared server state.
///
/// `orders` is the table every page reads. It is loaded once at startup and
/// only replaced by an edit when `persist_edits` is on; otherwise an edit is
/// applied to a copy that lives for that one response.
pub struct AppState {
    config: Config,
    store: RecordStore,
    tokens: TokenRegistry,
    orders: Mutex<Vec<Order>>,
    templates: Handlebars<'static>,
}

impl AppState {
    /// Prepare both data files (seeding orders on first run) and load the table.
    pub fn new(config: Config) -> Result<Self> {
        let store = RecordStore::new(config.orders_path());
        store.seed_if_missing()?;

        let tokens = TokenRegistry::new(config.tokens_path());
        tokens.ensure_file()?;

        let orders = store.load()?;
        log::info!(
            "Loaded {} orders from {}",
            orders.len(),
            store.path().display()
        );

        Ok(AppState {
            config,
            store,
            tokens,
            orders: Mutex::new(orders),
            templates: templates()?,
        })
    }

    fn orders(&self) -> MutexGuard<'_, Vec<Order>> {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, admin: Option<&str>, token: Option<&str>) -> Access {
        access::resolve(&self.config, &self.tokens, admin, token)
    }
}

fn templates() -> Result<Handlebars<'static>> {
    let mut templates = Handlebars::new();
    templates
        .register_template_string("dashboard", include_str!("./static/dashboard.html"))
        .map_err(|e| DashboardError::Template(e.to_string()))?;
    templates
        .register_template_string("faq", include_str!("./static/faq.html"))
        .map_err(|e| DashboardError::Template(e.to_string()))?;
    Ok(templates)
}

/// Build the router for `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_dashboard))
        .route("/faq", get(serve_faq))
        .route("/api/orders", get(list_orders))
        .route("/orders/update", post(update_order))
        .route("/tokens", post(issue_token))
        .route("/export/xlsx", get(export_xlsx))
        .route("/export/pdf", get(export_pdf))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Start the web server and block until it stops.
pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if config.uses_default_owner_key() {
        log::warn!("OWNER_KEY is still the default placeholder; set it before sharing this server");
    }
    if config.persist_edits {
        log::info!("Dashboard edits will be written back to the orders file");
    } else {
        log::info!("Dashboard edits are kept in memory only");
    }

    let bind = config.bind.clone();
    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let listener = TcpListener::bind(&bind).await?;
    log::info!("Listening on http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log method, path and status. The query string is left out since it
/// carries the owner key and tokens.
async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    log::info!("{} {} -> {}", method, path, response.status().as_u16());
    response
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match &self {
            DashboardError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Query string of the dashboard and the JSON API.
///
/// `filtered` is set by the filter form. Once it is present a column with no
/// selected values means "select nothing" rather than "use the default".
#[derive(Debug, Default, Deserialize)]
struct DashboardQuery {
    admin: Option<String>,
    token: Option<String>,
    #[serde(default)]
    warehouse: Vec<String>,
    #[serde(default)]
    status: Vec<String>,
    #[serde(default)]
    priority: Vec<String>,
    #[serde(default)]
    q: String,
    filtered: Option<String>,
}

impl DashboardQuery {
    fn with_access(admin: Option<String>, token: Option<String>) -> Self {
        DashboardQuery {
            admin,
            token,
            ..DashboardQuery::default()
        }
    }

    fn filter(&self) -> OrderFilter {
        let submitted = self.filtered.is_some();
        let choice = |values: &Vec<String>| {
            if submitted || !values.is_empty() {
                Some(values.clone())
            } else {
                None
            }
        };

        OrderFilter {
            warehouses: choice(&self.warehouse),
            statuses: choice(&self.status),
            priorities: choice(&self.priority),
            search: self.q.clone(),
        }
    }

    fn access_query(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(admin) = self.admin.as_deref().filter(|a| !a.is_empty()) {
            pairs.push(format!("admin={}", urlencoding::encode(admin)));
        }
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            pairs.push(format!("token={}", urlencoding::encode(token)));
        }
        pairs.join("&")
    }
}

#[derive(Serialize)]
struct Choice<'a> {
    value: &'a str,
    selected: bool,
}

fn choices<'a>(options: &'a [String], selection: &Option<Vec<String>>) -> Vec<Choice<'a>> {
    options
        .iter()
        .map(|value| Choice {
            value: value.as_str(),
            selected: selection
                .as_ref()
                .map_or(true, |chosen| chosen.iter().any(|c| c == value)),
        })
        .collect()
}

#[derive(Serialize)]
struct KpiCard {
    label: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct Message {
    kind: &'static str,
    text: String,
}

#[derive(Serialize)]
struct ShareLink {
    token: String,
    role: String,
    expires_at: String,
    url: String,
}

#[derive(Serialize)]
struct DashboardPage<'a> {
    company: &'a str,
    role: String,
    mode: &'static str,
    admin: Option<&'a str>,
    token: Option<&'a str>,
    access_query: String,
    warehouses: Vec<Choice<'a>>,
    statuses: Vec<Choice<'a>>,
    priorities: Vec<Choice<'a>>,
    search: &'a str,
    columns: [&'static str; 8],
    rows: Vec<[&'a str; 8]>,
    shown: usize,
    total: usize,
    kpis: Vec<KpiCard>,
    can_edit: bool,
    can_issue: bool,
    status_choices: Vec<&'static str>,
    role_choices: Vec<&'static str>,
    persist_edits: bool,
    default_owner_key: bool,
    message: Option<Message>,
    share: Option<ShareLink>,
}

fn render_dashboard(
    state: &AppState,
    orders: &[Order],
    query: &DashboardQuery,
    access: &Access,
    message: Option<Message>,
    share: Option<ShareLink>,
) -> Result<Html<String>> {
    let filter = query.filter();
    let options = FilterOptions::from_orders(orders);
    let kpis = Kpis::compute(orders);
    let rows: Vec<[&str; 8]> = filter
        .apply(orders)
        .into_iter()
        .map(Order::fields)
        .collect();

    let page = DashboardPage {
        company: &access.company,
        role: access.role.as_str().to_uppercase(),
        mode: access.mode.as_str(),
        admin: query.admin.as_deref(),
        token: query.token.as_deref(),
        access_query: query.access_query(),
        warehouses: choices(&options.warehouses, &filter.warehouses),
        statuses: choices(&options.statuses, &filter.statuses),
        priorities: choices(&options.priorities, &filter.priorities),
        search: &filter.search,
        columns: ORDER_COLUMNS,
        shown: rows.len(),
        rows,
        total: orders.len(),
        kpis: OrderStatus::ALL
            .into_iter()
            .map(|status| KpiCard {
                label: status.as_str(),
                count: kpis.count(status),
            })
            .collect(),
        can_edit: access.can_edit(),
        can_issue: access.can_issue_tokens(),
        status_choices: OrderStatus::ALL.iter().map(|s| s.as_str()).collect(),
        role_choices: [Role::Viewer, Role::Editor, Role::Owner]
            .iter()
            .map(|r| r.as_str())
            .collect(),
        persist_edits: state.config.persist_edits,
        default_owner_key: access.can_issue_tokens() && state.config.uses_default_owner_key(),
        message,
        share,
    };

    state
        .templates
        .render("dashboard", &page)
        .map(Html)
        .map_err(|e| DashboardError::Template(e.to_string()))
}

async fn serve_dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>> {
    let access = state.resolve(query.admin.as_deref(), query.token.as_deref());
    let orders = state.orders();
    render_dashboard(&state, &orders, &query, &access, None, None)
}

#[derive(Serialize)]
struct FaqEntry {
    number: usize,
    question: &'static str,
    answer: &'static str,
}

#[derive(Serialize)]
struct FaqPage {
    access_query: String,
    entries: Vec<FaqEntry>,
}

async fn serve_faq(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>> {
    let page = FaqPage {
        access_query: query.access_query(),
        entries: FAQ
            .iter()
            .enumerate()
            .map(|(i, (question, answer))| FaqEntry {
                number: i + 1,
                question,
                answer,
            })
            .collect(),
    };

    state
        .templates
        .render("faq", &page)
        .map(Html)
        .map_err(|e| DashboardError::Template(e.to_string()))
}

#[derive(Serialize)]
struct OrdersResponse<'a> {
    access: Access,
    options: FilterOptions,
    kpis: Kpis,
    total: usize,
    shown: usize,
    orders: Vec<&'a Order>,
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let access = state.resolve(query.admin.as_deref(), query.token.as_deref());
    let filter = query.filter();
    let orders = state.orders();
    let shown = filter.apply(&orders);

    Json(OrdersResponse {
        access,
        options: FilterOptions::from_orders(&orders),
        kpis: Kpis::compute(&orders),
        total: orders.len(),
        shown: shown.len(),
        orders: shown,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
struct UpdateForm {
    admin: Option<String>,
    token: Option<String>,
    order_id: String,
    status: String,
    #[serde(default)]
    invoice_no: String,
}

async fn update_order(
    State(state): State<Arc<AppState>>,
    Form(form): Form<UpdateForm>,
) -> Result<Response> {
    let access = state.resolve(form.admin.as_deref(), form.token.as_deref());
    if !access.can_edit() {
        return Ok((StatusCode::FORBIDDEN, "Editing requires an editor or owner role").into_response());
    }

    let update = OrderUpdate {
        order_id: form.order_id,
        status: form.status.parse()?,
        invoice_no: form.invoice_no,
    };

    // Edit a copy; the shared table only changes once the file write succeeds.
    let (orders, message) = {
        let mut shared = state.orders();
        let mut orders = shared.clone();
        let message = match apply_update(&mut orders, &update, access.role, Utc::now()) {
            Ok(order) => {
                log::info!(
                    "{} set {} to {}",
                    access.role,
                    order.order_id,
                    order.status
                );
                let text = if state.config.persist_edits {
                    state.store.persist(&orders)?;
                    *shared = orders.clone();
                    "Updated and saved."
                } else {
                    "Updated (temporary). Export to save locally."
                };
                Message {
                    kind: "success",
                    text: text.to_string(),
                }
            }
            Err(DashboardError::OrderNotFound(id)) => {
                log::info!("Update rejected, no order '{}'", id);
                Message {
                    kind: "error",
                    text: "Order not found".to_string(),
                }
            }
            Err(e) => return Err(e),
        };
        (orders, message)
    };

    let query = DashboardQuery::with_access(form.admin, form.token);
    let page = render_dashboard(&state, &orders, &query, &access, Some(message), None)?;
    Ok(page.into_response())
}

#[derive(Debug, Deserialize)]
struct TokenForm {
    admin: Option<String>,
    token: Option<String>,
    role: String,
    hours: i64,
}

async fn issue_token(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TokenForm>,
) -> Result<Response> {
    let access = state.resolve(form.admin.as_deref(), form.token.as_deref());
    if !access.can_issue_tokens() {
        return Ok((StatusCode::FORBIDDEN, "Only the owner can issue tokens").into_response());
    }

    let role: Role = form.role.parse()?;
    let ttl = ttl_from_hours(form.hours)?;
    let issued = state
        .tokens
        .issue(role, &state.config.client_company, ttl)?;

    let share = ShareLink {
        url: state.config.share_link(&issued.token),
        role: issued.role,
        expires_at: issued.expires_at,
        token: issued.token,
    };
    let message = Message {
        kind: "success",
        text: format!("Issued {} token", role),
    };

    let query = DashboardQuery::with_access(form.admin, form.token);
    let orders = state.orders();
    let page = render_dashboard(&state, &orders, &query, &access, Some(message), Some(share))?;
    Ok(page.into_response())
}

fn attachment(content_type: &'static str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

async fn export_xlsx(State(state): State<Arc<AppState>>) -> Result<Response> {
    let snapshot = state.orders().clone();
    let bytes = downloader::to_xlsx(&snapshot)?;
    Ok(attachment(XLSX_CONTENT_TYPE, "orders.xlsx", bytes))
}

async fn export_pdf(State(state): State<Arc<AppState>>) -> Result<Response> {
    let snapshot = state.orders().clone();
    let bytes = downloader::to_pdf(&snapshot, &state.config.client_company)?;
    Ok(attachment("application/pdf", "orders.pdf", bytes))
}
