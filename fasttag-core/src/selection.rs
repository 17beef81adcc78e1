/// Active company and item cursors plus the "show all companies" flag.
///
/// The item cursor only means something inside a company, so any change of
/// company selection clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    company: Option<String>,
    item: Option<String>,
    show_all: bool,
}

impl Selection {
    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn item(&self) -> Option<&str> {
        self.item.as_deref()
    }

    pub fn show_all(&self) -> bool {
        self.show_all
    }

    pub fn set_show_all(&mut self, show_all: bool) {
        self.show_all = show_all;
    }

    pub fn select_company(&mut self, company: Option<String>) {
        self.company = company;
        self.item = None;
    }

    pub fn select_item(&mut self, item: Option<String>) {
        self.item = item;
    }

    pub fn clear_item(&mut self) {
        self.item = None;
    }

    pub fn clear(&mut self) {
        self.company = None;
        self.item = None;
    }

    /// Follows a company rename without dropping the item cursor
    pub fn retarget_company(&mut self, old: &str, new: &str) {
        if self.company.as_deref() == Some(old) {
            self.company = Some(new.to_string());
        }
    }

    /// Follows an item re-tag
    pub fn retarget_item(&mut self, old: &str, new: &str) {
        if self.item.as_deref() == Some(old) {
            self.item = Some(new.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selecting_company_clears_item() {
        let mut selection = Selection::default();
        selection.select_company(Some("Acme".to_string()));
        selection.select_item(Some("X1".to_string()));
        assert_eq!(selection.item(), Some("X1"));

        selection.select_company(Some("Globex".to_string()));
        assert_eq!(selection.company(), Some("Globex"));
        assert_eq!(selection.item(), None);

        selection.select_item(Some("X2".to_string()));
        selection.select_company(None);
        assert_eq!(selection.item(), None);
    }

    #[test]
    fn test_retarget_company_keeps_item() {
        let mut selection = Selection::default();
        selection.select_company(Some("Acme".to_string()));
        selection.select_item(Some("X1".to_string()));

        selection.retarget_company("Acme", "Acme Ltd");
        assert_eq!(selection.company(), Some("Acme Ltd"));
        assert_eq!(selection.item(), Some("X1"));

        selection.retarget_company("Other", "Renamed");
        assert_eq!(selection.company(), Some("Acme Ltd"));
    }
}
