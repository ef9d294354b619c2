//! Handlers for `orders` subcommands.
//!
//! These are one-shot REST operations; the live feed is only used by `run`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::command::{DeleteArgs, ListArgs, OrderIdArgs, OrdersCommand, SetStatusArgs};
use super::{load_config, output};
use crate::adapter::outbound::rest::RestClient;
use crate::application::ReconciliationStore;
use crate::domain::{Order, OrderId, OrderStats};
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap;
use crate::port::OrderRepository;

/// Execute an `orders` subcommand.
pub async fn execute(command: &OrdersCommand) -> Result<()> {
    match command {
        OrdersCommand::List(args) => list(args).await,
        OrdersCommand::Show(args) => show(args).await,
        OrdersCommand::Stats(args) => stats(&args.config).await,
        OrdersCommand::SetStatus(args) => set_status(args).await,
        OrdersCommand::Delete(args) => delete(args).await,
    }
}

fn client(path: &std::path::Path) -> Result<Arc<RestClient>> {
    let config = load_config(path)?;
    bootstrap::rest_client(&config)
}

async fn fetch_all(rest: &RestClient) -> Result<Vec<Order>> {
    let pb = output::spinner("Fetching orders");
    match rest.fetch_all().await {
        Ok(orders) => {
            pb.finish_and_clear();
            Ok(orders)
        }
        Err(e) => {
            output::spinner_fail(&pb, "Failed to fetch orders");
            Err(e)
        }
    }
}

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Delivery")]
    delivery: String,
    #[tabled(rename = "Items")]
    items: u32,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.short().to_string(),
            status: order.status.to_string(),
            phone: order.customer_phone.clone(),
            delivery: order.delivery_method.to_string(),
            items: order.total_quantity(),
            total: order.total.to_string(),
            created: format_time(order.created_at),
        }
    }
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Product")]
    name: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Image")]
    image: String,
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

async fn list(args: &ListArgs) -> Result<()> {
    let rest = client(&args.config.config)?;

    let orders = fetch_all(&rest).await?;
    let mut store = ReconciliationStore::new();
    store.replace_all(orders);

    let filter = args.filter();
    let mut orders = filter.apply(store.orders(), Utc::now());
    if let Some(limit) = args.limit {
        orders.truncate(limit);
    }

    if orders.is_empty() && !output::is_json() {
        output::note("No orders match");
        return Ok(());
    }

    let rows: Vec<OrderRow> = orders.iter().map(|order| OrderRow::from(*order)).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    output::table("orders", table, &orders);
    output::field("Shown", format!("{} of {}", orders.len(), store.len()));
    output::field("Pending", store.pending_count());
    Ok(())
}

async fn show(args: &OrderIdArgs) -> Result<()> {
    let rest = client(&args.config.config)?;
    let id = OrderId::new(args.id.trim());
    let order = rest
        .fetch(&id)
        .await?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;

    if output::is_json() {
        output::record("order", &order);
        return Ok(());
    }

    let images = bootstrap::image_cache(rest);
    let mut rows = Vec::with_capacity(order.items.len());
    for item in &order.items {
        rows.push(ItemRow {
            name: item.name.clone(),
            quantity: item.quantity,
            price: item.price.to_string(),
            image: images.image_for_item(item).await,
        });
    }

    output::section(&format!("Order #{}", order.id.short()));
    output::field("Id", &order.id);
    output::field("Status", output::status(order.status));
    output::field("Phone", &order.customer_phone);
    output::field("Delivery", order.delivery_method);
    if !order.customer_residence.is_empty() || !order.customer_apartment.is_empty() {
        output::field(
            "Address",
            format!("{}, apt. {}", order.customer_residence, order.customer_apartment),
        );
    }
    output::field("Total", output::highlight(order.total));
    output::field("Created", format_time(order.created_at));
    if order.was_updated() {
        output::field("Updated", format_time(order.updated_at));
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    output::table("items", table, &order.items);
    Ok(())
}

async fn stats(path: &std::path::Path) -> Result<()> {
    let rest = client(path)?;
    let orders = fetch_all(&rest).await?;
    let stats = OrderStats::compute(&orders, Utc::now());

    if output::is_json() {
        output::record("stats", &stats);
        return Ok(());
    }

    output::section("Orders");
    output::field("Total", stats.total);
    output::field("Today", stats.today);
    output::field("Pending", stats.pending);
    output::field("In progress", stats.in_progress);
    output::field("Completed", stats.completed);
    output::field("Cancelled", stats.cancelled);
    output::field("Revenue", output::highlight(stats.revenue));
    Ok(())
}

async fn set_status(args: &SetStatusArgs) -> Result<()> {
    let rest = client(&args.config.config)?;
    let id = OrderId::new(args.id.trim());
    let current = rest
        .fetch(&id)
        .await?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;

    if current.status == args.status {
        output::note(&format!("Order #{} is already {}", id.short(), args.status));
        return Ok(());
    }

    let updated = rest.update_status(&id, args.status).await?;
    output::record("order", &updated);
    output::success(&format!(
        "Order #{} status changed from {} to {}",
        id.short(),
        current.status,
        output::status(updated.status)
    ));
    Ok(())
}

async fn delete(args: &DeleteArgs) -> Result<()> {
    let rest = client(&args.config.config)?;
    let id = OrderId::new(args.id.trim());

    if !args.yes {
        if output::is_json() {
            output::warning("Refusing to delete without --yes in JSON mode");
            return Ok(());
        }
        if !confirm(&format!("Delete order #{}?", id.short()))? {
            output::note("Aborted");
            return Ok(());
        }
    }

    rest.delete(&id).await?;
    output::success(&format!("Order #{} deleted", id.short()));
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
