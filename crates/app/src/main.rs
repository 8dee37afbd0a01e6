use gpui::*;
use gpui_component::Root;

use astra::app::{ChatApp, Quit, apply_theme};
use astra::config::SessionConfig;
use astra::session;

/// Application entry point.
///
/// Configuration and session setup run before the UI event loop starts, so
/// the window always receives a fully bootstrapped session bundle. Missing
/// required parameters abort startup; remote failures after this point are
/// the client's to surface.
fn main() {
    tracing_subscriber::fmt::init();

    let config = match SessionConfig::load() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("astra: {error}");
            std::process::exit(1);
        }
    };

    let (bundle, workers) = match session::bootstrap(&config) {
        Ok(session) => session,
        Err(error) => {
            eprintln!("astra: {error}");
            std::process::exit(1);
        }
    };

    let app = Application::new().with_assets(gpui_component_assets::Assets);

    app.run(move |cx| {
        gpui_tokio_bridge::init(cx);

        // Initialize gpui-component before any Root usage; this sets up the
        // theme system and component registry.
        gpui_component::init(cx);
        apply_theme(&bundle.theme, cx);

        cx.on_action(|_: &Quit, cx| {
            cx.quit();
        });
        cx.bind_keys([KeyBinding::new("cmd-q", Quit, None)]);

        // Spawn async window creation to ensure all initialization is complete.
        cx.spawn(async move |cx| {
            cx.update(|cx| {
                let options = WindowOptions {
                    window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                        None,
                        size(px(960.), px(720.)),
                        cx,
                    ))),
                    titlebar: Some(TitlebarOptions {
                        title: Some(SharedString::from("astra")),
                        ..Default::default()
                    }),
                    ..Default::default()
                };

                cx.open_window(options, |window, cx| {
                    let chat_app = cx.new(|cx| ChatApp::new(bundle, workers, window, cx));
                    cx.new(|cx| Root::new(chat_app, window, cx))
                })
                .expect("failed to open main window");

                cx.activate(true);
            })
        })
        .detach();
    });
}
