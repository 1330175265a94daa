//! Built-in attribute mapping for the order table.
//!
//! Pairs are `(meta key, column)`. Refund rows share the table, so the refund
//! attributes live here too.

pub const DEFAULT_ORDER_ATTRIBUTES: &[(&str, &str)] = &[
    ("_order_key", "order_key"),
    ("_customer_user", "customer_id"),
    ("_payment_method", "payment_method"),
    ("_payment_method_title", "payment_method_title"),
    ("_transaction_id", "transaction_id"),
    ("_customer_ip_address", "customer_ip_address"),
    ("_customer_user_agent", "customer_user_agent"),
    ("_created_via", "created_via"),
    ("_date_completed", "date_completed"),
    ("_date_paid", "date_paid"),
    ("_cart_hash", "cart_hash"),
    // Address indexes
    ("_billing_address_index", "billing_index"),
    ("_shipping_address_index", "shipping_index"),
    // Billing address
    ("_billing_first_name", "billing_first_name"),
    ("_billing_last_name", "billing_last_name"),
    ("_billing_company", "billing_company"),
    ("_billing_address_1", "billing_address_1"),
    ("_billing_address_2", "billing_address_2"),
    ("_billing_city", "billing_city"),
    ("_billing_state", "billing_state"),
    ("_billing_postcode", "billing_postcode"),
    ("_billing_country", "billing_country"),
    ("_billing_email", "billing_email"),
    ("_billing_phone", "billing_phone"),
    // Shipping address
    ("_shipping_first_name", "shipping_first_name"),
    ("_shipping_last_name", "shipping_last_name"),
    ("_shipping_company", "shipping_company"),
    ("_shipping_address_1", "shipping_address_1"),
    ("_shipping_address_2", "shipping_address_2"),
    ("_shipping_city", "shipping_city"),
    ("_shipping_state", "shipping_state"),
    ("_shipping_postcode", "shipping_postcode"),
    ("_shipping_country", "shipping_country"),
    // Totals
    ("_cart_discount", "discount_total"),
    ("_cart_discount_tax", "discount_tax"),
    ("_order_shipping", "shipping_total"),
    ("_order_shipping_tax", "shipping_tax"),
    ("_order_tax", "cart_tax"),
    ("_order_total", "total"),
    ("_order_version", "version"),
    ("_order_currency", "currency"),
    ("_prices_include_tax", "prices_include_tax"),
    // Refunds
    ("_refund_amount", "amount"),
    ("_refund_reason", "reason"),
    ("_refunded_by", "refunded_by"),
];
