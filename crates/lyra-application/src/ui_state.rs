//! Transient UI coordination.
//!
//! Pure state, no rendering: at most one per-conversation context menu open
//! at a time, and exactly one of {no modal, rename modal, delete-confirmation
//! modal}, each with a pending target id cleared on close. User actions
//! arrive as a discriminated enum routed through [`UiCoordinator::dispatch`],
//! keeping the controller decoupled from presentation markup.

/// Which modal is open, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    None,
    /// Rename dialog for `target`, pre-filled with the current title.
    Rename { target: i64, draft: String },
    /// Delete confirmation for `target`.
    ConfirmDelete { target: i64 },
}

impl ModalState {
    /// The conversation the open modal targets, if any.
    pub fn pending_target(&self) -> Option<i64> {
        match self {
            Self::None => None,
            Self::Rename { target, .. } | Self::ConfirmDelete { target } => Some(*target),
        }
    }
}

/// User actions affecting transient UI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// The per-conversation "…" button was pressed.
    ToggleMenu(i64),
    /// A click landed outside any open menu.
    OutsideClick,
    OpenRename { target: i64, current_title: String },
    OpenDelete { target: i64 },
    CloseModals,
}

/// Coordinates menus and modals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiCoordinator {
    open_menu: Option<i64>,
    modal: ModalState,
}

impl UiCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The conversation whose context menu is open, if any.
    pub fn open_menu(&self) -> Option<i64> {
        self.open_menu
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    /// Routes a user action to the corresponding transition.
    pub fn dispatch(&mut self, action: UiAction) {
        match action {
            UiAction::ToggleMenu(id) => self.toggle_menu(id),
            UiAction::OutsideClick => self.close_menus(),
            UiAction::OpenRename {
                target,
                current_title,
            } => self.open_rename(target, current_title),
            UiAction::OpenDelete { target } => self.open_delete(target),
            UiAction::CloseModals => self.close_modals(),
        }
    }

    /// Opens the menu for `id`, closing any other; pressing the button of
    /// the already-open menu closes it.
    fn toggle_menu(&mut self, id: i64) {
        self.open_menu = if self.open_menu == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    fn close_menus(&mut self) {
        self.open_menu = None;
    }

    fn open_rename(&mut self, target: i64, current_title: String) {
        self.close_menus();
        self.modal = ModalState::Rename {
            target,
            draft: current_title,
        };
    }

    fn open_delete(&mut self, target: i64) {
        self.close_menus();
        self.modal = ModalState::ConfirmDelete { target };
    }

    /// Closes whichever modal is open and clears its pending target.
    fn close_modals(&mut self) {
        self.modal = ModalState::None;
    }
}
