//! Ordered participant -> amount mapping

/// One participant's paid amount
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub name: String,
    pub amount: f64,
}

/// Contributions keyed by participant name.
///
/// Iteration follows first-insertion order. Re-inserting a name replaces its
/// amount in place (last write wins, position kept).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contributions {
    entries: Vec<Contribution>,
}

impl Contributions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a contribution, returning the amount it replaced
    pub fn insert(&mut self, name: impl Into<String>, amount: f64) -> Option<f64> {
        let name = name.into();
        match self.entries.iter_mut().find(|c| c.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.amount, amount)),
            None => {
                self.entries.push(Contribution { name, amount });
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.amount)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contribution> {
        self.entries.iter()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|c| c.amount).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Contributions {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut contributions = Self::new();
        for (name, amount) in iter {
            contributions.insert(name, amount);
        }
        contributions
    }
}

impl<'a> IntoIterator for &'a Contributions {
    type Item = &'a Contribution;
    type IntoIter = std::slice::Iter<'a, Contribution>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
