#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    #[default]
    Plain,
    Code,
    Emphasis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub style: TextStyle,
}

impl TextFragment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), style: TextStyle::Plain }
    }

    pub fn code(text: impl Into<String>) -> Self {
        Self { text: text.into(), style: TextStyle::Code }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextTicket(u64);

/// Dialogue surface supplied by the host. A presented sequence is complete once the
/// user has advanced past its last fragment.
pub trait TextSurface {
    fn present(&mut self, fragments: Vec<TextFragment>) -> TextTicket;
    fn is_complete(&self, ticket: TextTicket) -> bool;
    fn clear(&mut self);
}

struct ActiveText {
    ticket: TextTicket,
    fragments: Vec<TextFragment>,
    shown: usize,
}

/// Headless surface. Presenting replaces whatever was on screen; `advance` steps through
/// fragments the way a player pressing "next" would.
pub struct QueuedTextSurface {
    next_ticket: u64,
    active: Option<ActiveText>,
    auto_advance: bool,
}

impl QueuedTextSurface {
    pub fn new() -> Self {
        Self { next_ticket: 0, active: None, auto_advance: false }
    }

    /// Surface that completes every sequence as soon as it is presented.
    pub fn auto_advancing() -> Self {
        Self { auto_advance: true, ..Self::new() }
    }

    pub fn current(&self) -> Option<&TextFragment> {
        self.active.as_ref().and_then(|active| active.fragments.get(active.shown))
    }

    pub fn advance(&mut self) {
        if let Some(active) = &mut self.active {
            active.shown = (active.shown + 1).min(active.fragments.len());
        }
    }
}

impl Default for QueuedTextSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSurface for QueuedTextSurface {
    fn present(&mut self, fragments: Vec<TextFragment>) -> TextTicket {
        let ticket = TextTicket(self.next_ticket);
        self.next_ticket += 1;
        let shown = if self.auto_advance { fragments.len() } else { 0 };
        self.active = Some(ActiveText { ticket, fragments, shown });
        ticket
    }

    fn is_complete(&self, ticket: TextTicket) -> bool {
        match &self.active {
            Some(active) if active.ticket == ticket => active.shown >= active.fragments.len(),
            // replaced or cleared sequences never come back
            _ => true,
        }
    }

    fn clear(&mut self) {
        self.active = None;
    }
}
