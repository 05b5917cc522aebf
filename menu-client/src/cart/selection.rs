use rust_decimal::Decimal;
use shared::cart::NewLine;
use shared::models::{OptionGroup, OptionKind, Product};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Product {0} is out of stock")]
    ProductOutOfStock(i64),

    #[error("Option group {0} does not belong to this product")]
    UnknownGroup(i64),

    #[error("Option value {value_id} does not belong to group {group_id}")]
    UnknownValue { group_id: i64, value_id: i64 },

    #[error("Option value {0} is out of stock")]
    ValueOutOfStock(i64),

    #[error("Please choose {0}")]
    MissingRequired(String),
}

/// Choice state of one option group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSelection {
    /// Single-select group: at most one value, required before adding
    Single(Option<i64>),
    /// Multi-select group: any subset
    Multi(BTreeSet<i64>),
}

impl GroupSelection {
    fn empty_for(kind: OptionKind) -> Self {
        match kind {
            OptionKind::SingleSelect => Self::Single(None),
            OptionKind::MultiSelect => Self::Multi(BTreeSet::new()),
        }
    }

    fn value_ids(&self) -> Vec<i64> {
        match self {
            Self::Single(choice) => choice.iter().copied().collect(),
            Self::Multi(set) => set.iter().copied().collect(),
        }
    }
}

/// A product being configured before it is added to the cart
#[derive(Debug, Clone)]
pub struct ProductSelection {
    product: Product,
    groups: Vec<(OptionGroup, GroupSelection)>,
    quantity: i64,
    note: String,
}

impl ProductSelection {
    pub fn new(product: Product) -> Self {
        let mut option_groups = product.options.clone();
        option_groups.sort_by_key(|g| (g.display_order, g.id));
        let groups = option_groups
            .into_iter()
            .map(|g| {
                let selection = GroupSelection::empty_for(g.kind);
                (g, selection)
            })
            .collect();
        Self {
            product,
            groups,
            quantity: 1,
            note: String::new(),
        }
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn selection(&self, group_id: i64) -> Option<&GroupSelection> {
        self.groups
            .iter()
            .find(|(g, _)| g.id == group_id)
            .map(|(_, s)| s)
    }

    /// Choose a value. Single-select groups replace their choice,
    /// multi-select groups add it.
    pub fn choose(&mut self, group_id: i64, value_id: i64) -> Result<(), SelectionError> {
        let (group, selection) = self.group_mut(group_id)?;
        let value = group.value(value_id).ok_or(SelectionError::UnknownValue {
            group_id,
            value_id,
        })?;
        if value.is_out_of_stock {
            return Err(SelectionError::ValueOutOfStock(value_id));
        }
        match selection {
            GroupSelection::Single(choice) => *choice = Some(value_id),
            GroupSelection::Multi(set) => {
                set.insert(value_id);
            }
        }
        Ok(())
    }

    /// Deselect a value (no-op if it was not selected)
    pub fn unchoose(&mut self, group_id: i64, value_id: i64) -> Result<(), SelectionError> {
        let (_, selection) = self.group_mut(group_id)?;
        match selection {
            GroupSelection::Single(choice) => {
                if *choice == Some(value_id) {
                    *choice = None;
                }
            }
            GroupSelection::Multi(set) => {
                set.remove(&value_id);
            }
        }
        Ok(())
    }

    /// Requested quantity; the UI keeps it at 1 or more
    pub fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity.max(1);
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    /// Selected value ids, flattened in group display order
    pub fn option_value_ids(&self) -> Vec<i64> {
        self.groups.iter().flat_map(|(_, s)| s.value_ids()).collect()
    }

    /// Base price plus the adjustments of every selected value
    pub fn unit_price(&self) -> Decimal {
        let adjustments: Decimal = self
            .groups
            .iter()
            .flat_map(|(g, s)| {
                s.value_ids()
                    .into_iter()
                    .filter_map(|id| g.value(id).map(|v| v.price_adjustment))
            })
            .sum();
        self.product.base_price + adjustments
    }

    /// Check that the selection can be added to the cart
    pub fn validate(&self) -> Result<(), SelectionError> {
        if self.product.is_out_of_stock {
            return Err(SelectionError::ProductOutOfStock(self.product.id));
        }
        for (group, selection) in &self.groups {
            if matches!(selection, GroupSelection::Single(None)) {
                return Err(SelectionError::MissingRequired(group.name.clone()));
            }
            // stock may have changed since the value was chosen
            for id in selection.value_ids() {
                match group.value(id) {
                    Some(v) if v.is_out_of_stock => {
                        return Err(SelectionError::ValueOutOfStock(id));
                    }
                    Some(_) => {}
                    None => {
                        return Err(SelectionError::UnknownValue {
                            group_id: group.id,
                            value_id: id,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Validate and build the cart candidate (price snapshotted now)
    pub fn to_line(&self) -> Result<NewLine, SelectionError> {
        self.validate()?;
        let mut line = NewLine::new(self.product.id, self.product.name.clone(), self.unit_price())
            .with_quantity(self.quantity)
            .with_options(self.option_value_ids())
            .with_note(self.note.trim());
        line.image_url = self.product.image_url.clone();
        Ok(line)
    }

    fn group_mut(
        &mut self,
        group_id: i64,
    ) -> Result<(&OptionGroup, &mut GroupSelection), SelectionError> {
        self.groups
            .iter_mut()
            .find(|(g, _)| g.id == group_id)
            .map(|(g, s)| (&*g, s))
            .ok_or(SelectionError::UnknownGroup(group_id))
    }
}
