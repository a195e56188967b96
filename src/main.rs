// src/main.rs

use surface_bridge::config::CONFIG;
use surface_bridge::{DirtyRegion, FrameBuffer, KeySymbol, Rect, RenderLoop, Window, WindowEvent};

use anyhow::Context;
use log::info;
use std::cell::Cell;
use std::rc::Rc;

/// Edge length of the square that follows the pointer.
const CURSOR_SIZE: u32 = 24;

fn cursor_rect((x, y): (i32, i32)) -> Rect {
    let half = (CURSOR_SIZE / 2) as i32;
    Rect::new(x - half, y - half, CURSOR_SIZE, CURSOR_SIZE)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(CONFIG.logging.default_filter.as_str()),
    )
    .format_timestamp_micros()
    .init();

    info!("Starting surface-bridge...");
    let window_config = &CONFIG.window;
    let render_config = &CONFIG.render;

    let window = Window::open_on(
        window_config.display.as_deref(),
        &window_config.title,
        window_config.width,
        window_config.height,
    )
    .context("Failed to open window")?;

    let pointer = Rc::new(Cell::new((
        window_config.width as i32 / 2,
        window_config.height as i32 / 2,
    )));
    let background = 0xff00_0000 | render_config.background;
    let painted_pointer = Rc::clone(&pointer);
    let painter = move |frame: &mut FrameBuffer, _dirty: &DirtyRegion| -> anyhow::Result<()> {
        frame.clear(background);
        frame.fill_rect(&cursor_rect(painted_pointer.get()), 0xffe0_e0e0);
        Ok(())
    };

    let mut render = RenderLoop::new(window, painter, render_config.min_frame_interval())
        .context("Failed to set up render loop")?;
    let invalidation = render.invalidation_handle();
    let stop = render.window().stop_handle();
    render.window_mut().subscribe(move |event| match event {
        WindowEvent::PointerMove { x, y, .. } => {
            invalidation.invalidate(cursor_rect(pointer.get()));
            pointer.set((*x, *y));
            invalidation.invalidate(cursor_rect(pointer.get()));
        }
        WindowEvent::KeyDown {
            key: KeySymbol::Escape,
            ..
        } => {
            info!("Escape pressed, stopping");
            stop.stop();
        }
        WindowEvent::Close => info!("Window closed by the window manager"),
        _ => {}
    });

    render.window_mut().show().context("Failed to show window")?;
    render.run().context("Render loop failed")?;

    info!("surface-bridge exited.");
    Ok(())
}
