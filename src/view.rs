use crate::focus::{ControlDef, ControlId, FocusManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub usize);

/// Behaviour flags of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Saves the global focus on show and restores it on hide.
    pub modal: bool,
    /// Escape on any of its controls hides the view.
    pub escapable: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            modal: true,
            escapable: true,
        }
    }
}

/// Notification emitted when a view changes visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Shown(ViewId),
    Hidden(ViewId),
}

/// A panel with its own focus set.
#[derive(Debug)]
pub struct ModalView {
    pub id: ViewId,
    pub options: ViewOptions,
    pub focus: FocusManager,
    visible: bool,
    saved_focus: Option<(ViewId, ControlId)>,
}

impl ModalView {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Register a control and its children with this view.
    pub fn adopt(&mut self, def: ControlDef) -> ControlId {
        self.focus.build(def)
    }
}

/// All views plus their z-order.
#[derive(Debug, Default)]
pub struct ViewStack {
    views: Vec<ModalView>,
    /// Bottom to top.
    z_order: Vec<ViewId>,
    events: Vec<ViewEvent>,
}

impl ViewStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hidden view.
    pub fn create(&mut self, options: ViewOptions) -> ViewId {
        let id = ViewId(self.views.len());
        self.views.push(ModalView {
            id,
            options,
            focus: FocusManager::new(),
            visible: false,
            saved_focus: None,
        });
        self.z_order.push(id);
        id
    }

    pub fn get(&self, id: ViewId) -> Option<&ModalView> {
        self.views.get(id.0)
    }

    pub fn get_mut(&mut self, id: ViewId) -> Option<&mut ModalView> {
        self.views.get_mut(id.0)
    }

    pub fn is_visible(&self, id: ViewId) -> bool {
        self.get(id).is_some_and(|v| v.visible)
    }

    /// The topmost visible view; it receives keys.
    pub fn top(&self) -> Option<ViewId> {
        self.z_order
            .iter()
            .rev()
            .copied()
            .find(|&id| self.is_visible(id))
    }

    /// Visible views from bottom to top.
    pub fn visible(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.z_order.iter().copied().filter(|&id| self.is_visible(id))
    }

    /// The focused control of the topmost visible view.
    pub fn global_focus(&self) -> Option<(ViewId, ControlId)> {
        let top = self.top()?;
        let control = self.get(top)?.focus.focused()?;
        Some((top, control))
    }

    pub fn show(&mut self, id: ViewId) {
        if self.get(id).map_or(true, |v| v.visible) {
            return;
        }
        let saved = self.global_focus();
        self.z_order.retain(|&v| v != id);
        self.z_order.push(id);

        if let Some(view) = self.get_mut(id) {
            if view.options.modal {
                view.saved_focus = saved;
            }
            view.visible = true;
            view.focus.focus_first();
        }
        tracing::debug!("Showing view {:?}", id);
        self.events.push(ViewEvent::Shown(id));
    }

    pub fn hide(&mut self, id: ViewId) {
        let Some(view) = self.get_mut(id) else {
            return;
        };
        if !view.visible {
            return;
        }
        view.visible = false;
        let restore = if view.options.modal {
            view.saved_focus.take()
        } else {
            None
        };

        if let Some((owner, control)) = restore {
            if let Some(owner) = self.get_mut(owner) {
                owner.focus.focus(control);
            }
        }
        tracing::debug!("Hiding view {:?}", id);
        self.events.push(ViewEvent::Hidden(id));
    }

    /// Hide `id` if it is escapable. Returns whether it was hidden.
    pub fn escape(&mut self, id: ViewId) -> bool {
        if self.get(id).is_some_and(|v| v.visible && v.options.escapable) {
            self.hide(id);
            true
        } else {
            false
        }
    }

    /// Move focus to the next control of the topmost view.
    pub fn focus_next(&mut self) {
        if let Some(view) = self.top().and_then(|id| self.views.get_mut(id.0)) {
            view.focus.focus_next();
        }
    }

    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::focus::ControlKind;

    fn stack_with_base() -> (ViewStack, ViewId, ControlId, ControlId) {
        let mut stack = ViewStack::new();
        let base = stack.create(ViewOptions {
            modal: false,
            escapable: false,
        });
        let view = stack.get_mut(base).unwrap();
        let first = view.adopt(ControlDef::new(ControlKind::PathInput));
        let second = view.adopt(ControlDef::button("OK"));
        stack.show(base);
        (stack, base, first, second)
    }

    #[test]
    fn show_focuses_first_tab_stop_and_emits() {
        let (mut stack, base, first, _) = stack_with_base();
        assert_eq!(stack.global_focus(), Some((base, first)));
        assert_eq!(stack.take_events(), vec![ViewEvent::Shown(base)]);
    }

    #[test]
    fn modal_hide_restores_prior_focus() {
        let (mut stack, base, _, second) = stack_with_base();
        stack.get_mut(base).unwrap().focus.focus(second);

        let modal = stack.create(ViewOptions::default());
        let ok = stack.get_mut(modal).unwrap().adopt(ControlDef::button("OK"));
        stack.show(modal);
        assert_eq!(stack.global_focus(), Some((modal, ok)));

        stack.get_mut(base).unwrap().focus.focus_first();
        stack.hide(modal);
        assert_eq!(stack.global_focus(), Some((base, second)));
    }

    #[test]
    fn focus_next_moves_within_top_view() {
        let (mut stack, base, first, second) = stack_with_base();
        stack.focus_next();
        assert_eq!(stack.global_focus(), Some((base, second)));
        stack.focus_next();
        assert_eq!(stack.global_focus(), Some((base, first)));
    }

    #[test]
    fn show_and_hide_are_idempotent() {
        let (mut stack, base, _, _) = stack_with_base();
        stack.take_events();
        stack.show(base);
        assert!(stack.take_events().is_empty());

        stack.hide(base);
        stack.hide(base);
        assert_eq!(stack.take_events(), vec![ViewEvent::Hidden(base)]);
    }

    #[test]
    fn shown_view_is_raised_to_top() {
        let (mut stack, base, _, _) = stack_with_base();
        let other = stack.create(ViewOptions::default());
        stack.show(other);
        assert_eq!(stack.top(), Some(other));
        stack.hide(other);
        assert_eq!(stack.top(), Some(base));

        stack.hide(base);
        stack.show(base);
        stack.show(other);
        assert_eq!(stack.visible().collect::<Vec<_>>(), vec![base, other]);
    }

    #[test]
    fn escape_respects_escapable_flag() {
        let (mut stack, base, _, _) = stack_with_base();
        assert!(!stack.escape(base));
        let modal = stack.create(ViewOptions::default());
        stack.show(modal);
        assert!(stack.escape(modal));
        assert!(!stack.is_visible(modal));
    }
}
