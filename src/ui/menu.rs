/// Which menu actions are available
///
/// A pure function of three flags, so the enable/disable rules can be
/// tested without a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub pick: bool,
    pub add_caption: bool,
    pub save: bool,
    pub clear_caption: bool,
    pub clear_photo: bool,
}

impl MenuState {
    /// Everything off, used while a save is in flight
    pub const DISABLED: MenuState = MenuState {
        pick: false,
        add_caption: false,
        save: false,
        clear_caption: false,
        clear_photo: false,
    };

    pub fn derive(has_photo: bool, has_valid_caption: bool, saving: bool) -> Self {
        if saving {
            return Self::DISABLED;
        }
        let captioned = has_photo && has_valid_caption;
        Self {
            pick: true,
            add_caption: has_photo,
            save: captioned,
            clear_caption: captioned,
            clear_photo: has_photo,
        }
    }
}
