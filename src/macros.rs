//! Small crate-wide convenience macros.

/// Log a debug line to the browser console.
///
/// Compiled in for debug builds only.  On non-wasm targets there is no
/// console, so the arguments are still type-checked but nothing is emitted.
///
/// ```rust,ignore
/// debug_log!("Started drag of node {}", node_id);
/// ```
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        #[cfg(all(debug_assertions, target_arch = "wasm32"))]
        {
            web_sys::console::log_1(&format!($($arg)*).into());
        }
        #[cfg(not(all(debug_assertions, target_arch = "wasm32")))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

/// Log a warning to the browser console (all build profiles).
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        {
            web_sys::console::warn_1(&format!($($arg)*).into());
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}
