//! Sort/routing rule evaluator
//!
//! Partitions order items into print sections.
//! Priority: item override > product type > room > default.

use std::collections::HashMap;

use tracing::{debug, instrument};

use super::error::{PipelineError, PipelineResult};
use super::types::{PrintableItem, RuleSelector, SectionId, SortRule, SortedPrintSection};

/// Compiled rule set
///
/// Rules are kept in evaluation order: tier first, then the rule's ordering
/// index, then its position in the configuration.
#[derive(Debug, Clone)]
pub struct Router {
    rules: Vec<SortRule>,
    /// Section -> rank used to order the output
    section_rank: HashMap<SectionId, (i32, usize)>,
}

impl Router {
    /// Build the evaluator. Fails without a default rule.
    pub fn new(rules: &[SortRule]) -> PipelineResult<Self> {
        if !rules
            .iter()
            .any(|r| matches!(r.selector, RuleSelector::Default))
        {
            return Err(PipelineError::Configuration(
                "no default sort rule configured".to_string(),
            ));
        }

        let mut indexed: Vec<(usize, &SortRule)> = rules.iter().enumerate().collect();
        indexed.sort_by_key(|(pos, r)| (r.selector.tier(), r.order, *pos));

        let mut section_rank: HashMap<SectionId, (i32, usize)> = HashMap::new();
        for (pos, rule) in rules.iter().enumerate() {
            let rank = (rule.order, pos);
            section_rank
                .entry(rule.section.clone())
                .and_modify(|r| *r = (*r).min(rank))
                .or_insert(rank);
        }

        Ok(Self {
            rules: indexed.into_iter().map(|(_, r)| r.clone()).collect(),
            section_rank,
        })
    }

    /// First matching rule for an item
    pub fn rule_for(&self, item: &PrintableItem) -> Option<&SortRule> {
        self.rules.iter().find(|r| r.selector.matches(item))
    }

    pub fn section_for(&self, item: &PrintableItem) -> PipelineResult<&SectionId> {
        self.rule_for(item)
            .map(|r| &r.section)
            .ok_or_else(|| PipelineError::NoRouteForItem {
                item_id: item.id.clone(),
                name: item.name.clone(),
            })
    }

    /// Sections targeted by any rule, in output order
    pub fn sections(&self) -> Vec<&SectionId> {
        let mut sections: Vec<&SectionId> = self.section_rank.keys().collect();
        sections.sort_by_key(|s| self.section_rank.get(*s).copied());
        sections
    }

    /// Route every item to exactly one section
    ///
    /// Items keep their input order within a section; sections with no
    /// items are omitted.
    #[instrument(skip_all, fields(items = items.len()))]
    pub fn route(&self, items: &[PrintableItem]) -> PipelineResult<Vec<SortedPrintSection>> {
        let mut buckets: HashMap<&SectionId, Vec<PrintableItem>> = HashMap::new();
        for item in items {
            let section = self.section_for(item)?;
            debug!(item_id = %item.id, section = %section, "Routed item");
            buckets.entry(section).or_default().push(item.clone());
        }

        let mut sections: Vec<SortedPrintSection> = buckets
            .into_iter()
            .map(|(section, items)| SortedPrintSection {
                section: section.clone(),
                items,
            })
            .collect();
        sections.sort_by_key(|s| self.section_rank.get(&s.section).copied());
        Ok(sections)
    }
}

/// One-shot routing of `items` with `rules`
pub fn route_items(
    items: &[PrintableItem],
    rules: &[SortRule],
) -> PipelineResult<Vec<SortedPrintSection>> {
    Router::new(rules)?.route(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_money::Money;

    fn item(id: &str, room: Option<&str>, product_type: Option<&str>) -> PrintableItem {
        PrintableItem {
            id: id.to_string(),
            name: id.to_uppercase(),
            quantity: 1,
            unit_price: Money::from_minor(1000),
            modifiers: vec![],
            room_id: room.map(str::to_string),
            product_type_id: product_type.map(str::to_string),
            course: None,
            note: None,
        }
    }

    fn rule(id: &str, selector: RuleSelector, section: &str, order: i32) -> SortRule {
        SortRule {
            id: id.to_string(),
            selector,
            section: section.to_string(),
            order,
        }
    }

    fn ids(section: &SortedPrintSection) -> Vec<&str> {
        section.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_override_product_type_default_scenario() {
        let items = vec![
            item("a", None, Some("drinks")),
            item("b", None, Some("hot-food")),
            item("c", None, None),
        ];
        let rules = vec![
            rule("r-default", RuleSelector::Default, "kitchen", 0),
            rule("r-hot", RuleSelector::ProductType("hot-food".into()), "kitchen", 0),
            rule("r-a", RuleSelector::Item("a".into()), "bar", 1),
        ];

        let sections = route_items(&items, &rules).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section, "kitchen");
        assert_eq!(ids(&sections[0]), vec!["b", "c"]);
        assert_eq!(sections[1].section, "bar");
        assert_eq!(ids(&sections[1]), vec!["a"]);
    }

    #[test]
    fn test_product_type_outranks_room() {
        let items = vec![item("x", Some("terrace"), Some("cold-food"))];
        let rules = vec![
            rule("room", RuleSelector::Room("terrace".into()), "terrace-bar", 0),
            rule("pt", RuleSelector::ProductType("cold-food".into()), "cold", 5),
            rule("default", RuleSelector::Default, "kitchen", 9),
        ];

        let sections = route_items(&items, &rules).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section, "cold");
    }

    #[test]
    fn test_item_override_outranks_product_type() {
        let items = vec![item("x", None, Some("cold-food"))];
        let rules = vec![
            rule("pt", RuleSelector::ProductType("cold-food".into()), "cold", 0),
            rule("x", RuleSelector::Item("x".into()), "pass", 0),
            rule("default", RuleSelector::Default, "kitchen", 0),
        ];
        let router = Router::new(&rules).unwrap();
        assert_eq!(router.section_for(&items[0]).unwrap(), "pass");
    }

    #[test]
    fn test_room_rule_and_exact_match() {
        let rules = vec![
            rule("room", RuleSelector::Room("terrace".into()), "terrace-bar", 0),
            rule("default", RuleSelector::Default, "kitchen", 1),
        ];
        let router = Router::new(&rules).unwrap();
        assert_eq!(
            router.section_for(&item("x", Some("terrace"), None)).unwrap(),
            "terrace-bar"
        );
        // no prefix or case folding
        assert_eq!(
            router.section_for(&item("y", Some("Terrace"), None)).unwrap(),
            "kitchen"
        );
    }

    #[test]
    fn test_partition_is_exact() {
        let items: Vec<PrintableItem> = (0..20)
            .map(|n| {
                let pt = match n % 3 {
                    0 => Some("drinks"),
                    1 => Some("hot-food"),
                    _ => None,
                };
                let room = if n % 4 == 0 { Some("terrace") } else { None };
                item(&format!("i{}", n), room, pt)
            })
            .collect();
        let rules = vec![
            rule("d", RuleSelector::ProductType("drinks".into()), "bar", 0),
            rule("h", RuleSelector::ProductType("hot-food".into()), "kitchen", 1),
            rule("t", RuleSelector::Room("terrace".into()), "terrace", 2),
            rule("default", RuleSelector::Default, "kitchen", 3),
        ];

        let sections = route_items(&items, &rules).unwrap();
        let mut routed: Vec<&str> = sections.iter().flat_map(ids).collect();
        assert_eq!(routed.len(), items.len());
        routed.sort();
        routed.dedup();
        assert_eq!(routed.len(), items.len());

        // input order kept within each section
        for section in &sections {
            let positions: Vec<usize> = section
                .items
                .iter()
                .map(|i| items.iter().position(|x| x.id == i.id).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_empty_sections_omitted() {
        let rules = vec![
            rule("bar", RuleSelector::ProductType("drinks".into()), "bar", 0),
            rule("default", RuleSelector::Default, "kitchen", 1),
        ];
        let sections = route_items(&[item("x", None, None)], &rules).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section, "kitchen");

        assert!(route_items(&[], &rules).unwrap().is_empty());
    }

    #[test]
    fn test_missing_default_is_config_error() {
        let rules = vec![rule("bar", RuleSelector::ProductType("drinks".into()), "bar", 0)];
        let err = Router::new(&rules).unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_sections_in_rule_order() {
        let rules = vec![
            rule("default", RuleSelector::Default, "kitchen", 2),
            rule("bar", RuleSelector::ProductType("drinks".into()), "bar", 1),
            rule("pass", RuleSelector::Room("terrace".into()), "pass", 1),
        ];
        let router = Router::new(&rules).unwrap();
        assert_eq!(router.sections(), vec!["bar", "pass", "kitchen"]);
    }
}
