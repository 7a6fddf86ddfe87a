use std::fmt;

use crate::foods::repo_types::{CategoryCount, FoodSummary};

/// What the foods collection looks like after an import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub total: i64,
    /// Sorted by category name.
    pub categories: Vec<CategoryCount>,
    pub popular: i64,
    pub special_offers: i64,
    pub sample: Vec<FoodSummary>,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Import summary")?;
        writeln!(f, "  Total foods: {}", self.total)?;
        writeln!(f, "  By category:")?;
        for c in &self.categories {
            writeln!(f, "    {}: {}", c.category, c.count)?;
        }
        writeln!(f, "  Popular items: {}", self.popular)?;
        writeln!(f, "  Special offers: {}", self.special_offers)?;
        write!(f, "  Sample:")?;
        for s in &self.sample {
            write!(
                f,
                "\n    - {} ({}) ${:.2}, rating {}",
                s.name, s.category, s.price, s.rating
            )?;
        }
        Ok(())
    }
}
