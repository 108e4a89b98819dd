use super::*;
use crate::printing::types::{Modifier, PrintableItem};
use rust_decimal::Decimal;
use std::str::FromStr;

fn item(id: &str, quantity: u32, unit: i64, modifiers: &[i64]) -> PrintableItem {
    PrintableItem {
        id: id.to_string(),
        name: id.to_string(),
        quantity,
        unit_price: Money::from_minor(unit),
        modifiers: modifiers
            .iter()
            .map(|p| Modifier {
                name: format!("mod {}", p),
                price: Money::from_minor(*p),
            })
            .collect(),
        room_id: None,
        product_type_id: None,
        course: None,
        note: None,
    }
}

#[test]
fn test_total_with_discount() {
    let totals = OrderTotals {
        subtotal: Money::from_minor(5000),
        discount: Money::from_minor(1000),
        tax: Money::from_minor(250),
        tip: Money::ZERO,
    };
    assert_eq!(totals.total(), Money::from_minor(4250));
}

#[test]
fn test_total_includes_tip() {
    let totals = OrderTotals {
        subtotal: Money::from_minor(10000),
        discount: Money::ZERO,
        tax: Money::from_minor(2500),
        tip: Money::from_minor(1500),
    };
    assert_eq!(totals.total(), Money::from_minor(14000));
}

#[test]
fn test_format() {
    assert_eq!(Money::from_minor(12950).format(','), "129,50");
    assert_eq!(Money::from_minor(5).format('.'), "0.05");
    assert_eq!(Money::from_minor(-1000).format(','), "-10,00");
    assert_eq!(Money::ZERO.to_string(), "0.00");
}

#[test]
fn test_from_major_rounds_once() {
    assert_eq!(
        Money::from_major(Decimal::from_str("12.345").unwrap()),
        Money::from_minor(1235)
    );
    assert_eq!(
        Money::from_major(Decimal::from_str("-0.005").unwrap()),
        Money::from_minor(-1)
    );
    assert_eq!(
        Money::from_major(Decimal::from_str("99.99").unwrap()),
        Money::from_minor(9999)
    );
}

#[test]
fn test_percent_rounds_half_away_from_zero() {
    // 25 % of 0,02 = 0,005 -> 0,01
    let rate = Decimal::from_str("0.25").unwrap();
    assert_eq!(Money::from_minor(2).percent(rate), Money::from_minor(1));
    assert_eq!(Money::from_minor(4000).percent(rate), Money::from_minor(1000));
}

#[test]
fn test_line_total_includes_modifiers() {
    let i = item("burger", 2, 12900, &[1500, 0]);
    assert_eq!(i.line_total(), Money::from_minor(28800));
}

#[test]
fn test_totals_from_items() {
    let items = vec![item("a", 2, 2000, &[]), item("b", 1, 1000, &[])];
    let totals = OrderTotals::from_items(
        &items,
        Money::from_minor(1000),
        Decimal::from_str("0.0625").unwrap(),
        Money::ZERO,
    );
    assert_eq!(totals.subtotal, Money::from_minor(5000));
    assert_eq!(totals.tax, Money::from_minor(250));
    assert_eq!(totals.total(), Money::from_minor(4250));
}

#[test]
fn test_money_format_with_currency() {
    let fmt = MoneyFormat::default();
    assert_eq!(fmt.with_currency(Money::from_minor(4250)), "42,50 kr.");
    assert_eq!(MoneyFormat::new('.', "").with_currency(Money::from_minor(1)), "0.01");
}

#[test]
fn test_serde_transparent() {
    let m: Money = serde_json::from_str("4250").unwrap();
    assert_eq!(m, Money::from_minor(4250));
    assert_eq!(serde_json::to_string(&m).unwrap(), "4250");
}
