/// Identifier of a control within one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub usize);

/// The kinds of control a view can host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    Button { label: String },
    ColumnList { headers: Vec<String> },
    Text { scrollable: bool },
    PathInput,
    DirectoryTree,
    ContentList,
    Container { children: Vec<ControlId> },
}

/// A focusable control registered with a [`FocusManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub id: ControlId,
    pub kind: ControlKind,
    /// Non-negative values take part in Tab order.
    pub tab_index: i32,
    pub visible: bool,
}

impl Control {
    /// Caption of a button, empty for other kinds.
    pub fn label(&self) -> &str {
        match &self.kind {
            ControlKind::Button { label } => label,
            _ => "",
        }
    }
}

/// Description of a control to be built by [`FocusManager::build`].
#[derive(Debug, Clone)]
pub struct ControlDef {
    kind: ControlKind,
    tab_index: Option<i32>,
    visible: bool,
    children: Vec<ControlDef>,
}

impl ControlDef {
    pub fn new(kind: ControlKind) -> Self {
        Self {
            kind,
            tab_index: None,
            visible: true,
            children: Vec::new(),
        }
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self::new(ControlKind::Button {
            label: label.into(),
        })
    }

    /// A container that is not a tab stop itself.
    pub fn container(children: Vec<ControlDef>) -> Self {
        Self {
            kind: ControlKind::Container {
                children: Vec::new(),
            },
            tab_index: Some(-1),
            visible: true,
            children,
        }
    }

    pub fn tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = Some(tab_index);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Ordered set of focusable controls for one view.
#[derive(Debug, Default, Clone)]
pub struct FocusManager {
    controls: Vec<Control>,
    order: Vec<ControlId>,
    focused: Option<ControlId>,
    next_tab_index: i32,
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register a control, plus any children for containers.
    ///
    /// Controls without an explicit tab index get the next free one.
    pub fn build(&mut self, def: ControlDef) -> ControlId {
        let id = ControlId(self.controls.len());
        let tab_index = def.tab_index.unwrap_or(self.next_tab_index);
        self.next_tab_index = self.next_tab_index.max(tab_index + 1);
        self.register(Control {
            id,
            kind: def.kind,
            tab_index,
            visible: def.visible,
        });

        let children: Vec<ControlId> = def.children.into_iter().map(|c| self.build(c)).collect();
        if !children.is_empty() {
            if let Some(ControlKind::Container { children: slot }) =
                self.get_mut(id).map(|c| &mut c.kind)
            {
                *slot = children;
            }
        }
        id
    }

    /// Add a control, replacing an existing one with the same id.
    pub fn register(&mut self, control: Control) {
        match self.controls.iter_mut().find(|c| c.id == control.id) {
            Some(existing) => *existing = control,
            None => self.controls.push(control),
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        let mut ordered: Vec<&Control> = self.controls.iter().filter(|c| c.tab_index >= 0).collect();
        ordered.sort_by_key(|c| c.tab_index);
        self.order = ordered.into_iter().map(|c| c.id).collect();
    }

    pub fn get(&self, id: ControlId) -> Option<&Control> {
        self.controls.iter().find(|c| c.id == id)
    }

    /// Direct children of a container control.
    pub fn children(&self, id: ControlId) -> &[ControlId] {
        match self.get(id).map(|c| &c.kind) {
            Some(ControlKind::Container { children }) => children,
            _ => &[],
        }
    }

    fn get_mut(&mut self, id: ControlId) -> Option<&mut Control> {
        self.controls.iter_mut().find(|c| c.id == id)
    }

    /// Controls in Tab order.
    pub fn order(&self) -> &[ControlId] {
        &self.order
    }

    pub fn set_tab_index(&mut self, id: ControlId, tab_index: i32) {
        if let Some(control) = self.get_mut(id) {
            control.tab_index = tab_index;
        }
        self.recompute();
    }

    /// Show or hide a control. A hidden control that has focus passes it on.
    pub fn set_visible(&mut self, id: ControlId, visible: bool) {
        if let Some(control) = self.get_mut(id) {
            control.visible = visible;
        }
        if !visible && self.focused == Some(id) {
            let next = self.advance(id);
            self.focused = (next != id).then_some(next);
        }
    }

    pub fn is_visible(&self, id: ControlId) -> bool {
        self.get(id).is_some_and(|c| c.visible)
    }

    fn is_tab_stop(&self, id: ControlId) -> bool {
        self.get(id).is_some_and(|c| c.visible && c.tab_index >= 0)
    }

    /// The next visible control after `current` in Tab order, wrapping around.
    pub fn advance(&self, current: ControlId) -> ControlId {
        let Some(position) = self.order.iter().position(|&id| id == current) else {
            return self.first_visible().unwrap_or(current);
        };
        let count = self.order.len();
        (1..count)
            .map(|offset| self.order[(position + offset) % count])
            .find(|&id| self.is_tab_stop(id))
            .unwrap_or(current)
    }

    fn first_visible(&self) -> Option<ControlId> {
        self.order.iter().copied().find(|&id| self.is_tab_stop(id))
    }

    /// Focus the first visible control in Tab order.
    pub fn focus_first(&mut self) -> Option<ControlId> {
        self.focused = self.first_visible();
        self.focused
    }

    /// Move focus along the Tab order.
    pub fn focus_next(&mut self) -> Option<ControlId> {
        self.focused = match self.focused {
            Some(current) => Some(self.advance(current)),
            None => self.first_visible(),
        };
        self.focused
    }

    pub fn focus(&mut self, id: ControlId) {
        if self.get(id).is_some() {
            self.focused = Some(id);
        }
    }

    pub fn focused(&self) -> Option<ControlId> {
        self.focused
    }

    pub fn is_focused(&self, id: ControlId) -> bool {
        self.focused == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with(indices: &[i32]) -> (FocusManager, Vec<ControlId>) {
        let mut focus = FocusManager::new();
        let ids = indices
            .iter()
            .map(|&i| focus.build(ControlDef::new(ControlKind::PathInput).tab_index(i)))
            .collect();
        (focus, ids)
    }

    #[test]
    fn tab_order_sorts_and_excludes_negative() {
        let (focus, ids) = manager_with(&[2, -1, 0, 1]);
        assert_eq!(focus.order(), &[ids[2], ids[3], ids[0]]);
    }

    #[test]
    fn advance_skips_hidden_controls() {
        let (mut focus, ids) = manager_with(&[2, -1, 0, 1]);
        focus.set_visible(ids[3], false);
        assert_eq!(focus.advance(ids[2]), ids[0]);
    }

    #[test]
    fn advance_wraps_around() {
        let (focus, ids) = manager_with(&[0, 1, 2]);
        assert_eq!(focus.advance(ids[2]), ids[0]);
    }

    #[test]
    fn advance_with_no_other_visible_stays() {
        let (mut focus, ids) = manager_with(&[0, 1]);
        focus.set_visible(ids[1], false);
        assert_eq!(focus.advance(ids[0]), ids[0]);
    }

    #[test]
    fn focus_first_skips_hidden() {
        let (mut focus, ids) = manager_with(&[0, 1]);
        focus.set_visible(ids[0], false);
        assert_eq!(focus.focus_first(), Some(ids[1]));
    }

    #[test]
    fn registration_is_idempotent() {
        let (mut focus, ids) = manager_with(&[0, 1]);
        let control = focus.get(ids[1]).unwrap().clone();
        focus.register(control);
        assert_eq!(focus.order().len(), 2);
    }

    #[test]
    fn negative_tab_index_removes_from_order() {
        let (mut focus, ids) = manager_with(&[0, 1, 2]);
        focus.set_tab_index(ids[1], -1);
        assert_eq!(focus.order(), &[ids[0], ids[2]]);
    }

    #[test]
    fn factory_assigns_next_tab_index() {
        let mut focus = FocusManager::new();
        let a = focus.build(ControlDef::new(ControlKind::PathInput));
        let b = focus.build(ControlDef::new(ControlKind::DirectoryTree));
        assert_eq!(focus.get(a).unwrap().tab_index, 0);
        assert_eq!(focus.get(b).unwrap().tab_index, 1);
    }

    #[test]
    fn container_adopts_children() {
        let mut focus = FocusManager::new();
        let container = focus.build(ControlDef::container(vec![
            ControlDef::button("Resume"),
            ControlDef::button("Import"),
        ]));
        let children = focus.children(container);
        assert_eq!(children.len(), 2);
        assert_eq!(focus.order(), children);
        assert_eq!(focus.get(children[1]).unwrap().label(), "Import");
    }

    #[test]
    fn hiding_focused_control_moves_focus() {
        let (mut focus, ids) = manager_with(&[0, 1]);
        focus.focus_first();
        focus.set_visible(ids[0], false);
        assert_eq!(focus.focused(), Some(ids[1]));
    }
}
