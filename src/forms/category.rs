use super::Mode;
use crate::database;
use crate::database::models::{Category, CategoryId};
use crate::repository;
use diesel::QueryResult;

pub struct CategoryForm {
    mode: Mode<CategoryId>,
    pub name: String,
    error: Option<String>,
}

impl CategoryForm {
    pub fn add() -> Self {
        Self {
            mode: Mode::Add,
            name: String::new(),
            error: None,
        }
    }

    pub fn edit(category: &Category) -> Self {
        Self {
            mode: Mode::Edit(category.id),
            name: category.name.clone(),
            error: None,
        }
    }

    pub fn can_save(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn can_delete(&self) -> bool {
        matches!(self.mode, Mode::Edit(_))
    }

    /// Returns true when the save went through and the form should close.
    pub fn save(&mut self, conn: &mut database::Connection) -> bool {
        if !self.can_save() {
            return false;
        }
        let result = match self.mode {
            Mode::Add => repository::add_category(conn, &self.name).map(|_| ()),
            Mode::Edit(edit_id) => repository::edit_category(conn, edit_id, &self.name),
        };
        self.finish(result)
    }

    /// Edit mode only; the category's recipes are detached, not deleted.
    pub fn delete(&mut self, conn: &mut database::Connection) -> bool {
        let Mode::Edit(edit_id) = self.mode else {
            return false;
        };
        self.finish(repository::delete_category(conn, edit_id))
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn finish(&mut self, result: QueryResult<()>) -> bool {
        match result {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(error) => {
                self.error = Some(error.to_string());
                false
            }
        }
    }
}
