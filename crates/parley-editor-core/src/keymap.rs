//! Keyboard shortcuts for toolbar commands.
//!
//! Keys and modifiers are platform-agnostic; the front-end converts its
//! native key events into a `KeyCombo` and asks the `Keymap` what to do.

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::document::EditorDocument;
use crate::placeholders::Placeholders;
use crate::toolbar::ToolbarCommand;

/// A keyboard key, as far as the editor cares about it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    // === Modifiers ===
    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }

    /// Character keys compare case-insensitively; Shift is tracked in
    /// `Modifiers` instead.
    fn normalized(&self) -> Self {
        match self {
            Self::Character(s) => Self::Character(s.to_lowercase().into()),
            other => other.clone(),
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }
}

/// A key combination for triggering a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn shift(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::SHIFT,
        }
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary(is_mac),
        }
    }

    fn normalized(&self) -> Self {
        Self {
            key: self.key.normalized(),
            modifiers: self.modifiers,
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

/// Shortcut table from key combinations to toolbar commands.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<KeyCombo, ToolbarCommand>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard shortcuts, using Cmd on Mac and Ctrl elsewhere.
    pub fn default_bindings(is_mac: bool) -> Self {
        let mut keymap = Self::new();
        let mut primary = |c: &str, command: ToolbarCommand| {
            keymap.bind(KeyCombo::primary(Key::character(c), is_mac), command);
        };
        primary("b", ToolbarCommand::Bold);
        primary("i", ToolbarCommand::Italic);
        primary(
            "k",
            ToolbarCommand::Link {
                url: None,
                title: None,
            },
        );
        primary("q", ToolbarCommand::Blockquote);
        primary("e", ToolbarCommand::Code);
        primary("g", ToolbarCommand::Image { url: None });
        primary("o", ToolbarCommand::OrderedList);
        primary("u", ToolbarCommand::UnorderedList);
        primary("h", ToolbarCommand::Heading(2));
        primary("r", ToolbarCommand::HorizontalRule);
        primary("m", ToolbarCommand::InlineFormula);
        keymap.bind(KeyCombo::new(Key::Tab), ToolbarCommand::Indent);
        keymap.bind(KeyCombo::shift(Key::Tab), ToolbarCommand::Outdent);
        keymap
    }

    /// Add or replace a binding.
    pub fn bind(&mut self, combo: KeyCombo, command: ToolbarCommand) {
        self.bindings.insert(combo.normalized(), command);
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<&ToolbarCommand> {
        self.bindings.get(&combo.normalized())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Run the command bound to `combo`, if any.
    ///
    /// Only shortcuts are handled here. Navigation and bare modifier presses
    /// pass through; everything else is ordinary typing.
    pub fn handle_keydown<D: EditorDocument>(
        &self,
        doc: &mut D,
        combo: &KeyCombo,
        placeholders: &Placeholders,
    ) -> KeydownResult {
        if let Some(command) = self.lookup(combo) {
            command.execute(doc, placeholders);
            return KeydownResult::Handled;
        }

        if combo.key.is_navigation() || combo.key.is_modifier() {
            return KeydownResult::PassThrough;
        }

        KeydownResult::NotHandled
    }
}
