use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord};

use crate::error::Result;
use crate::theme::Theme;

pub const THEME_ATTRIBUTE: &str = "data-theme";

pub fn current(root: &Element) -> Theme {
    Theme::from_attribute(root.get_attribute(THEME_ATTRIBUTE).as_deref())
}

/// Calls back with the new theme whenever the root element's `data-theme`
/// attribute changes. Disconnects on drop.
pub struct ThemeObserver {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

impl ThemeObserver {
    pub fn watch<F>(root: Element, mut on_change: F) -> Result<Self>
    where
        F: FnMut(Theme) + 'static,
    {
        let target = root.clone();
        let callback = Closure::wrap(Box::new(move |records: js_sys::Array, _: MutationObserver| {
            let touched = records.iter().any(|r| {
                r.dyn_into::<MutationRecord>()
                    .ok()
                    .and_then(|r| r.attribute_name())
                    .is_some_and(|name| name == THEME_ATTRIBUTE)
            });
            if touched {
                on_change(current(&target));
            }
        }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_attributes(true);
        let filter = js_sys::Array::of1(&JsValue::from_str(THEME_ATTRIBUTE));
        options.set_attribute_filter(&filter);
        observer.observe_with_options(&root, &options)?;

        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for ThemeObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
