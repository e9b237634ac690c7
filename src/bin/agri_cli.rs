use std::{process::ExitCode, sync::Arc};

use agri_erp::{
    config::{self, AppConfig},
    errors::ErrorResponse,
    events::{process_events, Event, EventSender},
    metrics,
    models::{Order, OrderStatus, Product, Showroom, Transfer},
    open_backend, open_store,
    services::{
        inventory::AdjustmentKind,
        orders::{OrderLineRequest, PlaceOrderRequest},
        reports::{DateRange, ReportPeriod},
        transfers::TransferRequest,
    },
    storage::{seed::seed_defaults, Repository},
    AppServices,
};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tokio::{sync::mpsc, task::JoinHandle};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json {
                let body = ErrorResponse::from_anyhow(&err);
                match serde_json::to_string_pretty(&body) {
                    Ok(rendered) => println!("{}", rendered),
                    Err(_) => eprintln!("Error: {:#}", err),
                }
            } else {
                eprintln!("Error: {:?}", err);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let context = CliContext::initialize(&cli).await?;
    let json = cli.json;

    let outcome = match cli.command {
        Commands::Seed => handle_seed(&context, json).await,
        Commands::Products(command) => handle_products_command(&context, command, json).await,
        Commands::Stock(command) => handle_stock_command(&context, command, json).await,
        Commands::Orders(command) => handle_orders_command(&context, command, json).await,
        Commands::Transfers(command) => handle_transfers_command(&context, command, json).await,
        Commands::Showrooms(command) => handle_showrooms_command(&context, command, json).await,
        Commands::Reports(command) => handle_reports_command(&context, command, json).await,
        Commands::Auth(command) => handle_auth_command(&context, command, json).await,
        Commands::Metrics => {
            print!("{}", metrics::gather_text());
            Ok(())
        }
    };

    context.shutdown().await;
    outcome
}

#[derive(Parser)]
#[command(name = "agri-cli", about = "AgriERP stock, order and transfer management", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[arg(long, global = true, help = "Override the configured storage directory")]
    data_dir: Option<std::path::PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default dataset for any missing collection
    Seed,
    #[command(subcommand)]
    Products(ProductsCommands),
    #[command(subcommand)]
    Stock(StockCommands),
    #[command(subcommand)]
    Orders(OrdersCommands),
    #[command(subcommand)]
    Transfers(TransfersCommands),
    #[command(subcommand)]
    Showrooms(ShowroomsCommands),
    #[command(subcommand)]
    Reports(ReportsCommands),
    #[command(subcommand)]
    Auth(AuthCommands),
    /// Print Prometheus counters; they are process-local, so this only
    /// shows what the current run recorded (nothing is kept between runs)
    Metrics,
}

#[derive(Subcommand)]
enum ProductsCommands {
    List {
        #[arg(long, help = "Show availability at this showroom")]
        showroom: Option<String>,
    },
}

#[derive(Subcommand)]
enum StockCommands {
    Set(StockSetArgs),
    Move(StockMoveArgs),
    Adjust(StockAdjustArgs),
}

#[derive(Args)]
struct StockSetArgs {
    #[arg(long)]
    product: String,
    #[arg(long)]
    showroom: String,
    #[arg(long)]
    quantity: u32,
}

#[derive(Args)]
struct StockMoveArgs {
    #[arg(long)]
    product: String,
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long)]
    quantity: u32,
}

#[derive(Args)]
struct StockAdjustArgs {
    #[arg(long)]
    product: String,
    #[arg(long)]
    showroom: String,
    #[arg(long, value_enum)]
    kind: AdjustmentKindArg,
    #[arg(long)]
    quantity: u32,
    #[arg(long)]
    reason: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum AdjustmentKindArg {
    Add,
    Subtract,
}

impl From<AdjustmentKindArg> for AdjustmentKind {
    fn from(value: AdjustmentKindArg) -> Self {
        match value {
            AdjustmentKindArg::Add => AdjustmentKind::Add,
            AdjustmentKindArg::Subtract => AdjustmentKind::Subtract,
        }
    }
}

#[derive(Subcommand)]
enum OrdersCommands {
    Place(OrderPlaceArgs),
    List {
        #[arg(long)]
        showroom: Option<String>,
    },
    Advance {
        #[arg(long)]
        order: String,
        #[arg(long, value_enum)]
        status: OrderStatusArg,
    },
}

#[derive(Args)]
struct OrderPlaceArgs {
    #[arg(long)]
    showroom: String,
    #[arg(long)]
    customer_name: String,
    #[arg(long)]
    customer_phone: String,
    #[arg(long, default_value = "")]
    customer_address: String,
    #[arg(
        long = "item",
        value_parser = parse_order_item,
        required = true,
        help = "Line item as product_id=quantity; repeat for several lines"
    )]
    items: Vec<OrderLineRequest>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderStatusArg {
    Approved,
    Delivered,
}

impl From<OrderStatusArg> for OrderStatus {
    fn from(value: OrderStatusArg) -> Self {
        match value {
            OrderStatusArg::Approved => OrderStatus::Approved,
            OrderStatusArg::Delivered => OrderStatus::Delivered,
        }
    }
}

#[derive(Subcommand)]
enum TransfersCommands {
    Request(TransferRequestArgs),
    Approve {
        #[arg(long)]
        id: String,
        #[arg(long)]
        by: String,
    },
    Reject {
        #[arg(long)]
        id: String,
        #[arg(long)]
        by: String,
    },
    List {
        #[arg(long)]
        showroom: Option<String>,
        #[arg(long, action = ArgAction::SetTrue)]
        pending: bool,
    },
}

#[derive(Args)]
struct TransferRequestArgs {
    #[arg(long)]
    product: String,
    #[arg(long)]
    from: String,
    #[arg(long)]
    to: String,
    #[arg(long)]
    quantity: u32,
    #[arg(long)]
    requested_by: String,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum ShowroomsCommands {
    List,
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum ReportsCommands {
    StockValue {
        #[arg(long)]
        showroom: Option<String>,
    },
    LowStock,
    Dashboard,
    /// Sales figures for orders created within a period or date range
    Sales {
        #[arg(long, value_enum, conflicts_with_all = ["from", "to"])]
        period: Option<ReportPeriodArg>,
        #[arg(long, requires = "to", help = "First day (YYYY-MM-DD), inclusive")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from", help = "Last day (YYYY-MM-DD), inclusive")]
        to: Option<NaiveDate>,
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportPeriodArg {
    Week,
    Month,
    Quarter,
    Year,
}

impl From<ReportPeriodArg> for ReportPeriod {
    fn from(value: ReportPeriodArg) -> Self {
        match value {
            ReportPeriodArg::Week => ReportPeriod::Week,
            ReportPeriodArg::Month => ReportPeriod::Month,
            ReportPeriodArg::Quarter => ReportPeriod::Quarter,
            ReportPeriodArg::Year => ReportPeriod::Year,
        }
    }
}

#[derive(Subcommand)]
enum AuthCommands {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
}

struct CliContext {
    repo: Repository,
    services: AppServices,
    events: JoinHandle<()>,
}

impl CliContext {
    async fn initialize(cli: &Cli) -> Result<Self> {
        let mut config: AppConfig =
            config::load_config().context("failed to load application config")?;
        if let Some(dir) = &cli.data_dir {
            config.storage_dir = dir.clone();
        }
        config::init_tracing(&config.log_level, config.log_json);

        let backend = open_backend(&config)
            .await
            .context("failed to open storage backend")?;

        let (event_tx, event_rx) = mpsc::channel::<Event>(64);
        let events = tokio::spawn(process_events(event_rx));

        let store = open_store(&config, backend)
            .await
            .context("failed to open data store")?
            .with_events(EventSender::new(event_tx));
        let repo = store.repository().clone();
        let services = AppServices::new(Arc::new(store), &config);

        Ok(Self {
            repo,
            services,
            events,
        })
    }

    /// Drops the store's event sender and waits for the event loop to log
    /// everything already queued.
    async fn shutdown(self) {
        let Self {
            repo,
            services,
            events,
        } = self;
        drop(services);
        drop(repo);
        if let Err(err) = events.await {
            tracing::warn!(error = %err, "Event processing task ended abnormally");
        }
    }
}

async fn handle_seed(context: &CliContext, json: bool) -> Result<()> {
    let seeded = seed_defaults(&context.repo)
        .await
        .context("failed to seed default data")?;
    let keys: Vec<&str> = seeded.iter().map(|k| k.as_str()).collect();
    if json {
        print_json(&json!({ "seeded": keys }))?;
    } else if keys.is_empty() {
        println!("All collections already present; nothing seeded");
    } else {
        println!("Seeded: {}", keys.join(", "));
    }
    Ok(())
}

async fn handle_products_command(
    context: &CliContext,
    command: ProductsCommands,
    json: bool,
) -> Result<()> {
    match command {
        ProductsCommands::List { showroom: None } => {
            let products = context.services.inventory.list_products().await;
            if json {
                print_json(&products)?;
            } else {
                products.iter().for_each(render_product);
            }
        }
        ProductsCommands::List {
            showroom: Some(showroom),
        } => {
            let rows = context.services.reports.products_available_at(&showroom).await;
            if json {
                print_json(&rows)?;
            } else {
                for row in rows {
                    println!(
                        "- {} [{}] • {} {} available at showroom {}",
                        row.product.name, row.product.id, row.available_stock, row.product.unit, showroom
                    );
                }
            }
        }
    }
    Ok(())
}

async fn handle_stock_command(context: &CliContext, command: StockCommands, json: bool) -> Result<()> {
    let inventory = &context.services.inventory;
    match command {
        StockCommands::Set(args) => {
            let change = inventory
                .set_stock(&args.product, &args.showroom, args.quantity)
                .await
                .context("failed to set stock")?;
            if json {
                print_json(&change)?;
            } else {
                println!(
                    "Stock of {} at {}: {} -> {}",
                    args.product, args.showroom, change.old_quantity, change.new_quantity
                );
            }
        }
        StockCommands::Move(args) => {
            inventory
                .move_stock(&args.product, &args.from, &args.to, args.quantity)
                .await
                .context("failed to move stock")?;
            let product = inventory.get_product(&args.product).await?;
            if json {
                print_json(&product)?;
            } else {
                println!(
                    "Moved {} {} of {} from {} to {}",
                    args.quantity, product.unit, product.name, args.from, args.to
                );
                render_product(&product);
            }
        }
        StockCommands::Adjust(args) => {
            let change = inventory
                .adjust_stock(
                    &args.product,
                    &args.showroom,
                    args.kind.into(),
                    args.quantity,
                    args.reason,
                )
                .await
                .context("failed to adjust stock")?;
            if json {
                print_json(&change)?;
            } else {
                println!(
                    "Stock of {} at {}: {} -> {}",
                    args.product, args.showroom, change.old_quantity, change.new_quantity
                );
            }
        }
    }
    Ok(())
}

async fn handle_orders_command(
    context: &CliContext,
    command: OrdersCommands,
    json: bool,
) -> Result<()> {
    let orders = &context.services.orders;
    match command {
        OrdersCommands::Place(args) => {
            let order = orders
                .place_order(PlaceOrderRequest {
                    customer_name: args.customer_name,
                    customer_phone: args.customer_phone,
                    customer_address: args.customer_address,
                    showroom_id: args.showroom,
                    items: args.items,
                })
                .await
                .context("failed to place order")?;
            if json {
                print_json(&order)?;
            } else {
                render_order(&order);
            }
        }
        OrdersCommands::List { showroom } => {
            let list = match showroom {
                Some(id) => orders.orders_for_showroom(&id).await,
                None => orders.list_orders().await,
            };
            if json {
                print_json(&list)?;
            } else if list.is_empty() {
                println!("No orders");
            } else {
                list.iter().for_each(render_order);
            }
        }
        OrdersCommands::Advance { order, status } => {
            let order = orders
                .advance_order_status(&order, status.into())
                .await
                .context("failed to update order status")?;
            if json {
                print_json(&order)?;
            } else {
                render_order(&order);
            }
        }
    }
    Ok(())
}

async fn handle_transfers_command(
    context: &CliContext,
    command: TransfersCommands,
    json: bool,
) -> Result<()> {
    let transfers = &context.services.transfers;
    let transfer = match command {
        TransfersCommands::Request(args) => transfers
            .request_transfer(TransferRequest {
                product_id: args.product,
                from_showroom_id: args.from,
                to_showroom_id: args.to,
                quantity: args.quantity,
                requested_by: args.requested_by,
                notes: args.notes,
            })
            .await
            .context("failed to request transfer")?,
        TransfersCommands::Approve { id, by } => transfers
            .approve_transfer(&id, &by)
            .await
            .context("failed to approve transfer")?,
        TransfersCommands::Reject { id, by } => transfers
            .reject_transfer(&id, &by)
            .await
            .context("failed to reject transfer")?,
        TransfersCommands::List { showroom, pending } => {
            let mut list = match showroom {
                Some(id) => transfers.transfers_for_showroom(&id).await,
                None => transfers.list_transfers().await,
            };
            if pending {
                list.retain(|t| !t.status.is_terminal());
            }
            if json {
                print_json(&list)?;
            } else if list.is_empty() {
                println!("No transfers");
            } else {
                list.iter().for_each(render_transfer);
            }
            return Ok(());
        }
    };

    if json {
        print_json(&transfer)?;
    } else {
        render_transfer(&transfer);
    }
    Ok(())
}

async fn handle_showrooms_command(
    context: &CliContext,
    command: ShowroomsCommands,
    json: bool,
) -> Result<()> {
    let showrooms = &context.services.showrooms;
    match command {
        ShowroomsCommands::List => {
            let list = showrooms.list_showrooms().await;
            if json {
                print_json(&list)?;
            } else {
                list.iter().for_each(render_showroom);
            }
        }
        ShowroomsCommands::Delete { id } => {
            showrooms
                .delete_showroom(&id)
                .await
                .context("failed to delete showroom")?;
            if json {
                print_json(&json!({ "deleted": id }))?;
            } else {
                println!("Showroom {} deleted", id);
            }
        }
    }
    Ok(())
}

async fn handle_reports_command(
    context: &CliContext,
    command: ReportsCommands,
    json: bool,
) -> Result<()> {
    let reports = &context.services.reports;
    match command {
        ReportsCommands::StockValue { showroom } => {
            let value = reports.stock_value(showroom.as_deref()).await;
            if json {
                print_json(&json!({ "showroomId": showroom, "stockValue": value }))?;
            } else {
                let scope = showroom.as_deref().unwrap_or("all showrooms");
                println!("Stock value ({}): ₹{}", scope, value);
            }
        }
        ReportsCommands::LowStock => {
            let products = reports.low_stock_products().await;
            if json {
                print_json(&products)?;
            } else if products.is_empty() {
                println!(
                    "No products below {} units in total",
                    reports.low_stock_threshold()
                );
            } else {
                products.iter().for_each(render_product);
            }
        }
        ReportsCommands::Dashboard => {
            let summary = reports.dashboard_summary().await;
            if json {
                print_json(&summary)?;
            } else {
                println!("Products:          {}", summary.product_count);
                println!("Showrooms:         {}", summary.showroom_count);
                println!("Employees:         {}", summary.employee_count);
                println!(
                    "Orders:            {} ({} pending)",
                    summary.order_count, summary.pending_orders
                );
                println!("Pending transfers: {}", summary.pending_transfers);
                println!("Low stock:         {}", summary.low_stock_count);
                println!("Stock value:       ₹{}", summary.stock_value);
                println!("Revenue:           ₹{}", summary.revenue);
            }
        }
        ReportsCommands::Sales {
            period,
            from,
            to,
            top,
        } => {
            let range = match (from, to, period) {
                (Some(from), Some(to), _) => Some(
                    DateRange::from_dates(from, to).context("invalid report date range")?,
                ),
                (_, _, Some(period)) => Some(ReportPeriod::from(period).range_ending(Utc::now())),
                _ => None,
            };
            let summary = reports.sales_summary(range).await;
            let by_showroom = reports.sales_by_showroom(range).await;
            let by_category = reports.sales_by_category(range).await;
            let top_products = reports.top_products(top, range).await;
            if json {
                print_json(&json!({
                    "range": range,
                    "summary": summary,
                    "byShowroom": by_showroom,
                    "byCategory": by_category,
                    "topProducts": top_products,
                }))?;
            } else {
                match range {
                    Some(range) => println!("Sales from {} to {}", range.start, range.end),
                    None => println!("Sales (all time)"),
                }
                println!(
                    "Orders: {} • revenue ₹{} • GST ₹{} • average ₹{}",
                    summary.order_count,
                    summary.revenue,
                    summary.gst_collected,
                    summary.average_order_value
                );
                for row in by_showroom {
                    println!(
                        "- {} [{}] • {} orders • ₹{}",
                        row.showroom_name, row.showroom_id, row.order_count, row.revenue
                    );
                }
                for row in by_category {
                    println!("- {} • {} units • ₹{}", row.category, row.quantity, row.revenue);
                }
                for row in top_products {
                    println!(
                        "- {} [{}] • {} units • ₹{}",
                        row.product_name, row.product_id, row.quantity, row.revenue
                    );
                }
            }
        }
    }
    Ok(())
}

async fn handle_auth_command(context: &CliContext, command: AuthCommands, json: bool) -> Result<()> {
    let auth = &context.services.auth;
    match command {
        AuthCommands::Login { email, password } => {
            let session = auth
                .login(&email, &password)
                .await
                .context("failed to sign in")?;
            if json {
                print_json(&session)?;
            } else if let Some(user) = &session.user {
                println!("Signed in as {} ({})", user.name, user.role);
            }
        }
        AuthCommands::Logout => {
            auth.logout().await.context("failed to sign out")?;
            if !json {
                println!("Signed out");
            }
        }
        AuthCommands::Whoami => {
            let session = auth.current_session().await;
            if json {
                print_json(&session)?;
            } else {
                match &session.user {
                    Some(user) => println!(
                        "{} <{}> • {} • showroom {}",
                        user.name,
                        user.email,
                        user.role,
                        user.showroom_id.as_deref().unwrap_or("all")
                    ),
                    None => println!("Not signed in"),
                }
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_product(product: &Product) {
    let per_showroom: Vec<String> = product
        .stock
        .iter()
        .map(|(showroom, qty)| format!("{}={}", showroom, qty))
        .collect();
    println!(
        "- {} [{}] • {} • ₹{}/{} • GST {}% • total {} ({})",
        product.name,
        product.id,
        product.category,
        product.price,
        product.unit,
        product.gst,
        product.total_stock(),
        per_showroom.join(", ")
    );
}

fn render_order(order: &Order) {
    println!(
        "- Order {} [{}] • {} • showroom {} • status {} • total ₹{}",
        order.order_number, order.id, order.customer_name, order.showroom_id, order.status, order.total
    );
    for item in &order.items {
        println!(
            "  • {} x {} {} @ ₹{} (GST {}%)",
            item.quantity, item.unit, item.product_name, item.price, item.gst
        );
    }
}

fn render_transfer(transfer: &Transfer) {
    println!(
        "- Transfer {} • {} x {} • {} -> {} • {} • requested by {}{}",
        transfer.id,
        transfer.quantity,
        transfer.product_name,
        transfer.from_showroom_id,
        transfer.to_showroom_id,
        transfer.status,
        transfer.requested_by,
        transfer
            .approved_by
            .as_deref()
            .map(|by| format!(" • reviewed by {}", by))
            .unwrap_or_default()
    );
}

fn render_showroom(showroom: &Showroom) {
    println!(
        "- {} [{}] • {} • {} ({}, {})",
        showroom.name, showroom.id, showroom.location, showroom.contact_person, showroom.phone, showroom.email
    );
}

fn parse_order_item(raw: &str) -> Result<OrderLineRequest, String> {
    let (product_id, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid item '{raw}', expected product_id=quantity"))?;
    let quantity: u32 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity in '{raw}'"))?;
    if quantity == 0 {
        return Err("quantity must be greater than zero".to_string());
    }
    Ok(OrderLineRequest {
        product_id: product_id.trim().to_string(),
        quantity,
    })
}
