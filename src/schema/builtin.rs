//! Built-in retail analytics schema.
//!
//! Seven tables keyed by customer, product, promotion and transaction:
//! - `customer_behavior_metrics` - per-customer purchase aggregates
//! - `customer_info` - demographics and loyalty
//! - `customer_interaction_data` - digital engagement
//! - `product_info` - catalog attributes
//! - `promotional_data` - campaigns with start/end dates
//! - `sales_data` - per-customer sales totals
//! - `transaction_data` - individual purchases (joins everything)
//!
//! Dates are stored as `YYYY-MM-DD` text.

use super::catalog::{ColumnDescriptor as Col, ColumnType::*, SchemaDescriptor, TableDescriptor};

/// Version string embedded in the rendering.
pub const RETAIL_SCHEMA_VERSION: &str = "retail-1";

const LEVELS: &[&str] = &["Low", "Medium", "High"];
const YES_NO: &[&str] = &["Yes", "No"];
const DATE_HINT: &str = "stored as text YYYY-MM-DD";

/// Build the retail schema descriptor.
///
/// Column order inside every table is the declaration order the model must
/// reproduce for "all data" questions.
pub fn retail_schema() -> SchemaDescriptor {
    SchemaDescriptor {
        version: RETAIL_SCHEMA_VERSION.to_string(),
        tables: vec![
            customer_behavior_metrics(),
            customer_info(),
            customer_interaction_data(),
            product_info(),
            promotional_data(),
            sales_data(),
            transaction_data(),
        ],
    }
}

fn customer_behavior_metrics() -> TableDescriptor {
    TableDescriptor::new(
        "customer_behavior_metrics",
        "customer_id",
        vec![
            Col::new("avg_items_per_transaction", Float),
            Col::new("avg_purchase_value", Float).hint("currency"),
            Col::new("avg_spent_per_category", Float).hint("currency"),
            Col::new("avg_transaction_value", Float).hint("currency"),
            Col::new("customer_id", Integer),
            Col::new("days_since_last_purchase", Integer),
            Col::new("in_store_purchases", Integer),
            Col::new("last_purchase_date", Date).hint(DATE_HINT),
            Col::new("max_single_purchase_value", Float).hint("currency"),
            Col::new("min_single_purchase_value", Float).hint("currency"),
            Col::new("online_purchases", Integer),
            Col::new("purchase_frequency", Text).domain(&["Daily", "Weekly", "Monthly", "Yearly"]),
            Col::new("total_items_purchased", Integer),
            Col::new("total_transactions", Integer),
        ],
    )
    .describe("Aggregated purchase behaviour, one row per customer")
    .references("customer_id", "customer_info", "customer_id")
}

fn customer_info() -> TableDescriptor {
    TableDescriptor::new(
        "customer_info",
        "customer_id",
        vec![
            Col::new("age", Integer),
            Col::new("churned", Text).domain(YES_NO),
            Col::new("customer_id", Integer),
            Col::new("education_level", Text).domain(&["High School", "Bachelor's", "Master's", "PhD"]),
            Col::new("gender", Text).domain(&["Male", "Female", "Other"]),
            Col::new("income_bracket", Text).domain(LEVELS),
            Col::new("loyalty_program", Text).domain(YES_NO),
            Col::new("marital_status", Text).domain(&["Single", "Married", "Divorced"]),
            Col::new("membership_years", Integer),
            Col::new("number_of_children", Integer),
            Col::new("occupation", Text).nullable(),
        ],
    )
    .describe("Customer demographics, one row per customer")
}

fn customer_interaction_data() -> TableDescriptor {
    TableDescriptor::new(
        "customer_interaction_data",
        "customer_id",
        vec![
            Col::new("app_usage", Text).domain(LEVELS),
            Col::new("customer_id", Integer),
            Col::new("customer_support_calls", Integer),
            Col::new("email_subscriptions", Text).domain(YES_NO),
            Col::new("social_media_engagement", Text).domain(LEVELS),
            Col::new("website_visits", Integer),
        ],
    )
    .references("customer_id", "customer_info", "customer_id")
}

fn product_info() -> TableDescriptor {
    TableDescriptor::new(
        "product_info",
        "product_id",
        vec![
            Col::new("product_brand", Text),
            Col::new("product_category", Text),
            Col::new("product_color", Text).nullable(),
            Col::new("product_expiry_date", Date).nullable().hint(DATE_HINT),
            Col::new("product_id", Integer),
            Col::new("product_manufacture_date", Date).hint(DATE_HINT),
            Col::new("product_material", Text).nullable(),
            Col::new("product_name", Text),
            Col::new("product_rating", Float).hint("1 to 5"),
            Col::new("product_return_rate", Float).hint("fraction 0-1"),
            Col::new("product_review_count", Integer),
            Col::new("product_shelf_life", Integer).hint("days"),
            Col::new("product_size", Text).domain(&["Small", "Medium", "Large"]),
            Col::new("product_stock", Integer),
            Col::new("product_weight", Float).hint("kilograms"),
        ],
    )
}

fn promotional_data() -> TableDescriptor {
    TableDescriptor::new(
        "promotional_data",
        "promotion_id",
        vec![
            Col::new("avg_discount_used", Float).hint("fraction 0-1"),
            Col::new("promotion_channel", Text).domain(&["Online", "In-store", "Social Media"]),
            Col::new("promotion_effectiveness", Text).domain(LEVELS),
            Col::new("promotion_end_date", Date).hint(DATE_HINT),
            Col::new("promotion_id", Integer),
            Col::new("promotion_start_date", Date).hint(DATE_HINT),
            Col::new("promotion_target_audience", Text)
                .domain(&["New Customers", "Returning Customers"]),
            Col::new("promotion_type", Text)
                .domain(&["Buy One Get One Free", "Flash Sale", "20% Off"]),
        ],
    )
    .describe("Promotion campaigns; a promotion is active between its start and end dates")
}

fn sales_data() -> TableDescriptor {
    TableDescriptor::new(
        "sales_data",
        "customer_id",
        vec![
            Col::new("customer_id", Integer),
            Col::new("total_discounts_received", Float).hint("currency"),
            Col::new("total_returned_items", Integer),
            Col::new("total_returned_value", Float).hint("currency"),
            Col::new("total_sales", Float).hint("currency"),
        ],
    )
    .references("customer_id", "customer_info", "customer_id")
}

fn transaction_data() -> TableDescriptor {
    TableDescriptor::new(
        "transaction_data",
        "transaction_id",
        vec![
            Col::new("customer_id", Integer),
            Col::new("discount_applied", Float).hint("fraction 0-1"),
            Col::new("payment_method", Text)
                .domain(&["Cash", "Credit Card", "Debit Card", "Mobile Payment"]),
            Col::new("preferred_store", Text),
            Col::new("product_id", Integer),
            Col::new("promotion_id", Integer).nullable(),
            Col::new("quantity", Integer),
            Col::new("store_location", Text),
            Col::new("transaction_date", Date).hint(DATE_HINT),
            Col::new("transaction_hour", Integer).hint("0-23"),
            Col::new("transaction_id", Integer),
            Col::new("unit_price", Float).hint("currency"),
        ],
    )
    .describe("Individual purchases; revenue is quantity * unit_price")
    .references("customer_id", "customer_info", "customer_id")
    .references("product_id", "product_info", "product_id")
    .references("promotion_id", "promotional_data", "promotion_id")
}
