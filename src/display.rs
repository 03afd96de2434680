use anyhow::{anyhow, Result};
use image::DynamicImage;
use viuer::{print, Config as ViuerConfig};
use std::io::{IsTerminal, Write};

/// Default terminal columns per slice pane
const PANE_WIDTH: u32 = 24;

/// Where and how large the frame is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Number of panes side by side, used for the default width
    pub panes: u32,
}

impl DisplaySize {
    /// viuer (width, height); width wins when both are given
    #[must_use]
    pub fn terminal_cells(&self) -> (Option<u32>, Option<u32>) {
        match (self.width, self.height) {
            (Some(w), ..) => (Some(w), None),
            (None, Some(h)) => (None, Some(h)),
            (None, None) => (Some(PANE_WIDTH * self.panes.max(1)), None),
        }
    }
}

/// Print `image` at the cursor position
pub fn print_image(image: &DynamicImage, size: &DisplaySize) -> Result<()> {
    print_at(image, size, None)
}

/// Print `image` with its top-left corner at terminal cell (0, `row`)
pub fn print_image_at(image: &DynamicImage, size: &DisplaySize, row: u16) -> Result<()> {
    print_at(image, size, Some(row))
}

fn print_at(image: &DynamicImage, size: &DisplaySize, row: Option<u16>) -> Result<()> {
    let is_tty = std::io::stdout().is_terminal();
    let (config_width, config_height) = size.terminal_cells();

    let config = ViuerConfig {
        width: config_width,
        height: config_height,
        absolute_offset: row.is_some(),
        y: row.map_or(0, |r| i16::try_from(r).unwrap_or(i16::MAX)),
        use_kitty: is_tty,
        use_iterm: is_tty,
        use_sixel: is_tty,
        ..Default::default()
    };

    std::io::stdout().flush()
        .map_err(|e| anyhow!("Failed to flush stdout: {e}"))?;

    print(image, &config)
        .map_err(|e| anyhow!("Failed to display image: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_width_scales_with_panes() {
        let size = DisplaySize { width: None, height: None, panes: 3 };
        assert_eq!(size.terminal_cells(), (Some(72), None));

        let single = DisplaySize { panes: 1, ..size };
        assert_eq!(single.terminal_cells(), (Some(24), None));
    }

    #[test]
    fn test_explicit_width_wins() {
        let size = DisplaySize { width: Some(40), height: Some(10), panes: 3 };
        assert_eq!(size.terminal_cells(), (Some(40), None));

        let by_height = DisplaySize { width: None, height: Some(10), panes: 3 };
        assert_eq!(by_height.terminal_cells(), (None, Some(10)));
    }
}
