use crate::models::view_state::{ViewMode, ViewState};
use crate::state::AppState;

/// Acciones sobre la vista de una sesión de cliente
pub struct ViewController {
    state: AppState,
    session: String,
}

impl ViewController {
    pub fn new(state: AppState, session: String) -> Self {
        Self { state, session }
    }

    pub async fn current(&self) -> ViewState {
        self.state.view(&self.session).await
    }

    pub async fn toggle_view(&self) -> ViewMode {
        self.state.update_view(&self.session, ViewState::toggle_view).await
    }

    pub async fn toggle_dark_mode(&self) -> bool {
        self.state
            .update_view(&self.session, ViewState::toggle_dark_mode)
            .await
    }

    pub async fn show_detail(&self, id: i64) -> ViewState {
        self.state
            .update_view(&self.session, |view| {
                view.show_detail(id);
                view.clone()
            })
            .await
    }

    pub async fn close_detail(&self, id: i64) -> ViewState {
        self.state
            .update_view(&self.session, |view| {
                view.close_detail(id);
                view.clone()
            })
            .await
    }
}
