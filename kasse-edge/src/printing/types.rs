//! Kitchen/receipt printing types

use chrono::{DateTime, Utc};
use kasse_printer::{Capabilities, Charset, PrinterFamily};
use serde::{Deserialize, Serialize};

use crate::order_money::{Money, OrderTotals};

/// Logical print station ("kitchen", "bar", "receipt")
pub type SectionId = String;

/// Selected modifier on an order line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    /// Price adjustment per unit
    #[serde(default)]
    pub price: Money,
}

/// One order line as it is printed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintableItem {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub product_type_id: Option<String>,
    #[serde(default)]
    pub course: Option<u32>,
    /// Free-text kitchen note
    #[serde(default)]
    pub note: Option<String>,
}

impl PrintableItem {
    /// `(unit price + modifier prices) * quantity`
    pub fn line_total(&self) -> Money {
        let unit = self.unit_price + self.modifiers.iter().map(|m| m.price).sum::<Money>();
        unit.times(self.quantity)
    }
}

/// What a sort rule matches on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RuleSelector {
    /// Explicit assignment of one item
    Item(String),
    ProductType(String),
    Room(String),
    /// Catches everything; one must exist
    Default,
}

impl RuleSelector {
    /// Evaluation tier, lower wins
    pub fn tier(&self) -> u8 {
        match self {
            RuleSelector::Item(_) => 0,
            RuleSelector::ProductType(_) => 1,
            RuleSelector::Room(_) => 2,
            RuleSelector::Default => 3,
        }
    }

    /// Exact identifier match
    pub fn matches(&self, item: &PrintableItem) -> bool {
        match self {
            RuleSelector::Item(id) => item.id == *id,
            RuleSelector::ProductType(id) => item.product_type_id.as_deref() == Some(id.as_str()),
            RuleSelector::Room(id) => item.room_id.as_deref() == Some(id.as_str()),
            RuleSelector::Default => true,
        }
    }
}

/// Routing rule: items matching `selector` print at `section`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRule {
    pub id: String,
    pub selector: RuleSelector,
    pub section: SectionId,
    /// Relative ordering index; lower sorts first
    #[serde(default)]
    pub order: i32,
}

/// Items routed to one section, in original order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortedPrintSection {
    pub section: SectionId,
    pub items: Vec<PrintableItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    KitchenTicket,
    CustomerReceipt,
    /// Printer self-check, not tied to an order
    TestPage,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::KitchenTicket => "kitchen_ticket",
            ContentType::CustomerReceipt => "customer_receipt",
            ContentType::TestPage => "test_page",
        }
    }
}

/// Order lifecycle points that can trigger automatic printing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintTrigger {
    Placed,
    Paid,
}

impl PrintTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintTrigger::Placed => "placed",
            PrintTrigger::Paid => "paid",
        }
    }

    /// Content printed automatically at this point
    pub fn content_type(&self) -> ContentType {
        match self {
            PrintTrigger::Placed => ContentType::KitchenTicket,
            PrintTrigger::Paid => ContentType::CustomerReceipt,
        }
    }
}

fn default_width() -> usize {
    48
}

fn default_true() -> bool {
    true
}

fn default_auto_print() -> Vec<PrintTrigger> {
    vec![PrintTrigger::Placed]
}

/// Static configuration of a physical printer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterProfile {
    pub id: String,
    pub name: String,
    /// Section this printer serves
    pub section: SectionId,
    /// `http://…`, `tcp://host:port`, `host:port` or `host`
    pub connection: String,
    pub family: PrinterFamily,
    /// Paper width in characters (32 for 58mm, 48 for 80mm)
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default)]
    pub charset: Charset,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default = "default_true")]
    pub kitchen_tickets: bool,
    #[serde(default)]
    pub customer_receipts: bool,
    /// Triggers that print without operator action
    #[serde(default = "default_auto_print")]
    pub auto_print: Vec<PrintTrigger>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl PrinterProfile {
    pub fn prints(&self, content_type: ContentType) -> bool {
        match content_type {
            ContentType::KitchenTicket => self.kitchen_tickets,
            ContentType::CustomerReceipt => self.customer_receipts,
            ContentType::TestPage => true,
        }
    }

    pub fn auto_prints_on(&self, trigger: PrintTrigger) -> bool {
        self.auto_print.contains(&trigger)
    }
}

/// Payment shown on a customer receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLine {
    /// "Card", "Cash", "Gift card", …
    pub method: String,
    pub amount: Money,
    /// Masked card or gift card code
    #[serde(default)]
    pub reference: Option<String>,
}

/// Order-level data for headers and totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMeta {
    pub order_id: String,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_address: Option<String>,
    /// Company registration / VAT number
    #[serde(default)]
    pub company_vat: Option<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub guest_count: Option<u32>,
    #[serde(default)]
    pub staff_name: Option<String>,
    /// Moment the print trigger fired; also the content's generation time
    pub printed_at: DateTime<Utc>,
    #[serde(default)]
    pub totals: OrderTotals,
    #[serde(default)]
    pub payments: Vec<PaymentLine>,
    #[serde(default)]
    pub footer: Option<String>,
    /// Times this order was printed before (reprint banner)
    #[serde(default)]
    pub print_count: u32,
}

/// Everything the store returns for one order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintableOrder {
    pub meta: OrderMeta,
    pub items: Vec<PrintableItem>,
}

/// Encoded output for one section, ready for transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptContent {
    pub printer_id: String,
    pub section: SectionId,
    pub content_type: ContentType,
    pub generated_at: DateTime<Utc>,
    pub bytes: Vec<u8>,
}
