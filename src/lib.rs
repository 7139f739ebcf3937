pub mod mixer;

#[cfg(feature = "desktop")]
use tauri::Manager;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            if let Some(window) = app.get_webview_window("main") {
                let _ = window.center();
            }

            if cfg!(debug_assertions) {
                app.handle().plugin(
                    tauri_plugin_log::Builder::default()
                        .level(log::LevelFilter::Info)
                        .level_for("tao", log::LevelFilter::Error)
                        .level_for("winit", log::LevelFilter::Error)
                        .build(),
                )?;
            }
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            mixer::pick_source_root,
            mixer::get_mixer_settings,
            mixer::save_mixer_settings,
            mixer::get_tool_status,
            mixer::scan_source_folders,
            mixer::mix_videos,
            mixer::open_output_dir
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
