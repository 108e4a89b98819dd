//! Receipt content builder
//!
//! Turns a routed section plus order metadata into a directive list for one
//! printer profile, then encodes it for the profile's family. The same input
//! always yields the same bytes: the only clock involved is
//! `OrderMeta::printed_at`.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use kasse_printer::{Directive, TicketBuilder, encode};
use tracing::instrument;

use super::error::{PipelineError, PipelineResult};
use super::types::{
    ContentType, OrderMeta, PrintableItem, PrinterProfile, ReceiptContent, SortedPrintSection,
};
use crate::order_money::{Money, MoneyFormat};

/// Lines fed before cutting so the last line clears the cutter
const FEED_BEFORE_CUT: u8 = 3;

/// Renders kitchen tickets, customer receipts and test pages
#[derive(Debug, Clone)]
pub struct ReceiptRenderer {
    timezone: Tz,
    money: MoneyFormat,
}

impl ReceiptRenderer {
    pub fn new(timezone: Tz, money: MoneyFormat) -> Self {
        Self { timezone, money }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Build and encode the content of one section for one printer
    #[instrument(skip_all, fields(
        order_id = %meta.order_id,
        section = %section.section,
        printer_id = %profile.id,
        content_type = content_type.as_str(),
    ))]
    pub fn build_receipt(
        &self,
        section: &SortedPrintSection,
        meta: &OrderMeta,
        profile: &PrinterProfile,
        content_type: ContentType,
    ) -> PipelineResult<ReceiptContent> {
        let directives = self.directives(section, meta, profile, content_type);
        self.encode_for(profile, &section.section, content_type, meta.printed_at, &directives)
    }

    /// Directive list without encoding
    pub fn directives(
        &self,
        section: &SortedPrintSection,
        meta: &OrderMeta,
        profile: &PrinterProfile,
        content_type: ContentType,
    ) -> Vec<Directive> {
        let mut b = TicketBuilder::new(profile.width, profile.charset, profile.capabilities);
        match content_type {
            ContentType::KitchenTicket => self.render_kitchen(&mut b, section, meta),
            ContentType::CustomerReceipt => self.render_receipt(&mut b, section, meta),
            ContentType::TestPage => self.render_test_page(&mut b, profile, meta.printed_at),
        }
        b.build()
    }

    /// Self-check page showing the profile's settings
    pub fn test_page(
        &self,
        profile: &PrinterProfile,
        now: DateTime<Utc>,
    ) -> PipelineResult<ReceiptContent> {
        let mut b = TicketBuilder::new(profile.width, profile.charset, profile.capabilities);
        self.render_test_page(&mut b, profile, now);
        let directives = b.build();
        self.encode_for(profile, &profile.section, ContentType::TestPage, now, &directives)
    }

    fn encode_for(
        &self,
        profile: &PrinterProfile,
        section: &str,
        content_type: ContentType,
        generated_at: DateTime<Utc>,
        directives: &[Directive],
    ) -> PipelineResult<ReceiptContent> {
        let bytes = encode(directives, profile.family).map_err(|source| PipelineError::Encode {
            printer_id: profile.id.clone(),
            source,
        })?;

        Ok(ReceiptContent {
            printer_id: profile.id.clone(),
            section: section.to_string(),
            content_type,
            generated_at,
            bytes,
        })
    }

    fn timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.timezone)
            .format("%d-%m-%Y %H:%M")
            .to_string()
    }

    // ========================================================================
    // Kitchen ticket
    // ========================================================================

    fn render_kitchen(
        &self,
        b: &mut TicketBuilder,
        section: &SortedPrintSection,
        meta: &OrderMeta,
    ) {
        // Table name (large, centered)
        b.center();
        if let Some(table) = &meta.table_name {
            b.double_size();
            b.bold();
            b.line(table);
            b.bold_off();
            b.reset_size();
        }

        if let Some(room) = &meta.room_name {
            b.line(room);
        }
        b.line(&section.section.to_uppercase());
        b.left();

        let order_label = meta
            .order_number
            .as_deref()
            .map(|n| format!("Order #{}", n))
            .unwrap_or_default();
        b.line_lr(&order_label, &self.timestamp(meta.printed_at));
        if meta.staff_name.is_some() || meta.guest_count.is_some() {
            let staff = meta.staff_name.as_deref().unwrap_or("");
            let guests = meta
                .guest_count
                .map(|g| format!("Guests: {}", g))
                .unwrap_or_default();
            b.line_lr(staff, &guests);
        }
        b.sep_double();

        for (course, items) in group_by_course(&section.items) {
            if let Some(course) = course {
                b.bold();
                b.line(&format!("-- Course {} --", course));
                b.bold_off();
            }
            for item in items {
                self.render_kitchen_item(b, item);
            }
            b.sep_single();
        }

        self.render_reprint_banner(b, meta);
        b.feed(FEED_BEFORE_CUT);
        b.cut();
    }

    fn render_kitchen_item(&self, b: &mut TicketBuilder, item: &PrintableItem) {
        b.double_height();
        self.lr_clipped(
            b,
            &format!("{} x {}", item.quantity, item.name),
            &self.money.amount(item.line_total()),
        );
        b.reset_size();

        for modifier in &item.modifiers {
            b.line_clipped(&format!("   + {}", modifier.name));
        }

        if let Some(note) = item.note.as_deref().filter(|n| !n.is_empty()) {
            b.bold();
            b.line_clipped(&format!("   * {}", note));
            b.bold_off();
        }
    }

    fn render_reprint_banner(&self, b: &mut TicketBuilder, meta: &OrderMeta) {
        if meta.print_count > 0 {
            b.newline();
            b.center();
            b.bold();
            b.line(&format!("*** REPRINT #{} ***", meta.print_count));
            b.bold_off();
            b.left();
        }
    }

    // ========================================================================
    // Customer receipt
    // ========================================================================

    fn render_receipt(
        &self,
        b: &mut TicketBuilder,
        section: &SortedPrintSection,
        meta: &OrderMeta,
    ) {
        b.center();
        if let Some(name) = &meta.company_name {
            b.double_size();
            b.bold();
            b.line(name);
            b.bold_off();
            b.reset_size();
        }
        if let Some(address) = &meta.company_address {
            b.line(address);
        }
        if let Some(vat) = &meta.company_vat {
            b.line(&format!("VAT: {}", vat));
        }
        b.left();
        b.newline();

        let order_label = meta
            .order_number
            .as_deref()
            .map(|n| format!("Order #{}", n))
            .unwrap_or_default();
        b.line_lr(&order_label, &self.timestamp(meta.printed_at));

        let table = match (&meta.room_name, &meta.table_name) {
            (Some(room), Some(table)) => format!("{} / {}", room, table),
            (None, Some(table)) => table.clone(),
            (Some(room), None) => room.clone(),
            (None, None) => String::new(),
        };
        let guests = meta
            .guest_count
            .map(|g| format!("Guests: {}", g))
            .unwrap_or_default();
        if !table.is_empty() || !guests.is_empty() {
            b.line_lr(&table, &guests);
        }
        if let Some(staff) = &meta.staff_name {
            b.line(&format!("Served by: {}", staff));
        }
        b.sep_double();

        // Items
        for item in &section.items {
            self.lr_clipped(
                b,
                &format!("{} x {}", item.quantity, item.name),
                &self.money.amount(item.line_total()),
            );
            for modifier in &item.modifiers {
                if modifier.price.is_zero() {
                    b.line_clipped(&format!("   + {}", modifier.name));
                } else {
                    b.line_clipped(&format!(
                        "   + {} ({})",
                        modifier.name,
                        self.signed(modifier.price)
                    ));
                }
            }
        }
        b.sep_single();

        // Totals
        let totals = &meta.totals;
        b.line_lr("Subtotal", &self.money.amount(totals.subtotal));
        b.line_lr("Discount", &self.money.amount(-totals.discount));
        b.line_lr("Tax", &self.money.amount(totals.tax));
        b.line_lr("Tip", &self.money.amount(totals.tip));
        b.sep_single();
        b.bold();
        b.line_lr("TOTAL", &self.money.with_currency(totals.total()));
        b.bold_off();

        // Payments
        if !meta.payments.is_empty() {
            b.sep_single();
            for payment in &meta.payments {
                self.lr_clipped(b, &payment.method, &self.money.amount(payment.amount));
                if let Some(reference) = &payment.reference {
                    b.line_clipped(&format!("   Ref: {}", reference));
                }
            }
        }

        self.render_reprint_banner(b, meta);

        if let Some(footer) = meta.footer.as_deref().filter(|f| !f.is_empty()) {
            b.newline();
            b.center();
            for line in footer.lines() {
                b.line_clipped(line);
            }
            b.left();
        }

        b.feed(FEED_BEFORE_CUT);
        b.cut();
    }

    /// Left/right line with the left side shortened to keep the amount visible
    fn lr_clipped(&self, b: &mut TicketBuilder, left: &str, right: &str) {
        let charset = b.charset();
        let room = b.width().saturating_sub(charset.width(right) + 1);
        let left = charset.truncate(left, room);
        b.line_lr(&left, right);
    }

    fn signed(&self, money: Money) -> String {
        if money.minor() > 0 {
            format!("+{}", self.money.amount(money))
        } else {
            self.money.amount(money)
        }
    }

    // ========================================================================
    // Test page
    // ========================================================================

    fn render_test_page(
        &self,
        b: &mut TicketBuilder,
        profile: &PrinterProfile,
        now: DateTime<Utc>,
    ) {
        b.center();
        b.double_size();
        b.bold();
        b.line("TEST PAGE");
        b.bold_off();
        b.reset_size();
        b.line(&profile.name);
        b.left();
        b.sep_double();

        b.line_lr("Printer", &profile.id);
        b.line_lr("Section", &profile.section);
        b.line_lr("Family", profile.family.as_str());
        b.line_lr("Width", &profile.width.to_string());
        b.line_lr("Charset", &format!("{:?}", profile.charset));
        b.line_clipped(&format!("Address: {}", profile.connection));
        b.line_lr("Time", &self.timestamp(now));
        b.sep_single();

        let ruler: String = "1234567890".chars().cycle().take(profile.width).collect();
        b.line(&ruler);
        b.line_clipped(match profile.charset {
            kasse_printer::Charset::Windows1252 => "ÆØÅ æøå € 0123456789",
            kasse_printer::Charset::Gbk => "中文测试 0123456789",
        });
        b.bold();
        b.line("Bold text");
        b.bold_off();
        b.double_size();
        b.line("Large");
        b.reset_size();
        b.right();
        b.line("Right");
        b.left();

        b.feed(FEED_BEFORE_CUT);
        b.cut();
    }
}

impl Default for ReceiptRenderer {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Copenhagen, MoneyFormat::default())
    }
}

/// Group items by course: items without a course first, then ascending
///
/// Items keep their routed order inside a course.
fn group_by_course(items: &[PrintableItem]) -> Vec<(Option<u32>, Vec<&PrintableItem>)> {
    let mut sorted: Vec<&PrintableItem> = items.iter().collect();
    sorted.sort_by_key(|i| i.course);

    let mut groups: Vec<(Option<u32>, Vec<&PrintableItem>)> = Vec::new();
    for item in sorted {
        match groups.last_mut() {
            Some((course, group)) if *course == item.course => group.push(item),
            _ => groups.push((item.course, vec![item])),
        }
    }
    groups
}
