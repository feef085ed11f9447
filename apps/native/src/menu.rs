use core_types::NavigationIntent;

/// A vertical list with one highlighted row, standing in for the real UI.
#[derive(Debug, Clone)]
pub struct Menu {
    items: Vec<String>,
    selected: usize,
}

impl Menu {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            selected: 0,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }

    /// Apply one intent. Returns the activated item for `Enter`.
    pub fn apply(&mut self, intent: NavigationIntent) -> Option<&str> {
        let len = self.items.len();
        if len == 0 {
            return None;
        }
        match intent {
            NavigationIntent::MoveUp => {
                self.selected = (self.selected + len - 1) % len;
                None
            }
            NavigationIntent::MoveDown => {
                self.selected = (self.selected + 1) % len;
                None
            }
            NavigationIntent::Enter => self.selected(),
        }
    }
}
