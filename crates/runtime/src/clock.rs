/// Wall-clock label used to stamp diagnostic entries.
///
/// In the browser this is the locale time string; natively it is local
/// `HH:MM:SS`.
pub fn time_label() -> String {
    #[cfg(target_arch = "wasm32")]
    {
        String::from(js_sys::Date::new_0().to_locale_time_string("en-US"))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        chrono::Local::now().format("%H:%M:%S").to_string()
    }
}
