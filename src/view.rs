use log::info;
use minifb::{MouseButton, MouseMode, Window, WindowOptions};

use crate::{
    errors::{FaceSegError, Result},
    label_map::LabelMap,
    render,
};

fn display_error(err: minifb::Error) -> FaceSegError {
    FaceSegError::Display {
        message: err.to_string(),
    }
}

/// Show the colour-mapped label map and block until the window is closed,
/// a key is pressed or the window is clicked.
pub fn show_label_map(labels: &LabelMap, title: &str) -> Result<()> {
    let image = render::colorize(labels);
    let (width, height) = (image.width() as usize, image.height() as usize);
    let buffer = render::to_argb(&image);

    let mut window =
        Window::new(title, width, height, WindowOptions::default()).map_err(display_error)?;
    window.set_target_fps(30);

    info!("Press any key or click the window to close it");
    while window.is_open() {
        window
            .update_with_buffer(&buffer, width, height)
            .map_err(display_error)?;

        let clicked = window.get_mouse_down(MouseButton::Left)
            && window.get_mouse_pos(MouseMode::Discard).is_some();
        if clicked || !window.get_keys().is_empty() {
            break;
        }
    }
    Ok(())
}
