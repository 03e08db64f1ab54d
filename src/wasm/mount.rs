use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Document, Element, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, Window};

use super::render::{AnimationFrames, CanvasSurface};
use super::theme::{self, ThemeObserver};
use crate::animation::{self, AnimationHandle};
use crate::config::{FieldConfig, SurfaceTarget};
use crate::error::{FieldError, Result};
use crate::field::ParticleField;
use crate::geometry::{Geometry, Vec2};
use crate::pointer;
use crate::theme::Theme;

thread_local! {
    // instances mounted by `autostart` live as long as the page
    static AUTOSTARTED: RefCell<Vec<Instance>> = const { RefCell::new(Vec::new()) };
}

/// Event listener that is removed from its target when dropped.
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn add<F>(target: &EventTarget, event: &'static str, handler: F) -> Result<Self>
    where
        F: FnMut(Event) + 'static,
    {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Err(e) = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref())
        {
            log::debug!("could not remove {} listener: {}", self.event, FieldError::from(e));
        }
    }
}

/// Element whose size the canvas follows.
#[derive(Clone)]
enum Sizing {
    /// Bounding rectangle of the canvas's parent
    ParentRect(Element),
    /// Layout size of the container holding the canvas
    Offset(HtmlElement),
}

impl Sizing {
    fn measure(&self, window: &Window) -> Geometry {
        let (width, height) = match self {
            Sizing::ParentRect(el) => {
                let rect = el.get_bounding_client_rect();
                (rect.width(), rect.height())
            }
            Sizing::Offset(el) => (el.offset_width() as f64, el.offset_height() as f64),
        };
        Geometry::with_pixel_ratio(width, height, window.device_pixel_ratio())
    }
}

fn viewport_width(window: &Window, fallback: f64) -> f64 {
    window
        .inner_width()
        .ok()
        .and_then(|w| w.as_f64())
        .unwrap_or(fallback)
}

/// Locate (or create) the canvas for `target`. Returns the canvas, the
/// element it is sized from and the element receiving pointer events.
fn locate(document: &Document, target: &SurfaceTarget) -> Result<(HtmlCanvasElement, Sizing, EventTarget)> {
    let missing = || FieldError::SurfaceNotFound(target.describe().to_string());
    match target {
        SurfaceTarget::CanvasId { id } => {
            let canvas = document
                .get_element_by_id(id)
                .ok_or_else(missing)?
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| FieldError::InvalidConfig(format!("element '{id}' is not a canvas")))?;
            let parent = canvas
                .parent_element()
                .unwrap_or_else(|| canvas.clone().into());
            let events: EventTarget = canvas.clone().into();
            Ok((canvas, Sizing::ParentRect(parent), events))
        }
        SurfaceTarget::Container { selector } => {
            let container = document
                .query_selector(selector)?
                .ok_or_else(missing)?
                .dyn_into::<HtmlElement>()
                .map_err(|_| FieldError::InvalidConfig(format!("'{selector}' is not an HTML element")))?;
            let canvas = document
                .create_element("canvas")?
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| FieldError::Host("could not create a canvas".to_string()))?;
            container.append_child(&canvas)?;
            let events: EventTarget = container.clone().into();
            Ok((canvas, Sizing::Offset(container), events))
        }
    }
}

/// A running field with its host wiring. Dropping it stops the loop and
/// detaches every listener.
struct Instance {
    field: Rc<RefCell<ParticleField>>,
    handle: AnimationHandle,
    _listeners: Vec<Listener>,
    _theme: Option<ThemeObserver>,
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

impl Instance {
    /// Mount `config` onto its surface; `Ok(None)` when the surface is absent.
    fn mount(config: FieldConfig) -> Result<Option<Self>> {
        let window = web_sys::window().ok_or_else(|| FieldError::Host("no window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| FieldError::Host("no document".to_string()))?;

        let (canvas, sizing, events) = match locate(&document, &config.surface) {
            Ok(found) => found,
            Err(FieldError::SurfaceNotFound(what)) => {
                log::warn!("particle surface '{what}' not found, not starting");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let geometry = sizing.measure(&window);
        let surface = CanvasSurface::new(canvas.clone())?;
        surface.resize(&geometry)?;

        let interactive = config.interactive;
        let themed = config.themes.is_some();
        let field = ParticleField::new(config, geometry, viewport_width(&window, geometry.width))?;
        let field = Rc::new(RefCell::new(field));
        let surface = Rc::new(RefCell::new(surface));

        let mut listeners = Vec::new();

        listeners.push({
            let (field, surface, window) = (field.clone(), surface.clone(), window.clone());
            Listener::add(&window.clone().into(), "resize", move |_| {
                let geometry = sizing.measure(&window);
                if let Err(e) = surface.borrow().resize(&geometry) {
                    log::error!("canvas resize failed: {e}");
                }
                field
                    .borrow_mut()
                    .resize(geometry, viewport_width(&window, geometry.width));
            })?
        });

        if interactive {
            listeners.push({
                let (field, canvas) = (field.clone(), canvas.clone());
                Listener::add(&events, "mousemove", move |event| {
                    let Some(event) = event.dyn_ref::<MouseEvent>() else {
                        return;
                    };
                    let rect = canvas.get_bounding_client_rect();
                    let local = pointer::to_local(
                        Vec2::new(event.client_x() as f64, event.client_y() as f64),
                        Vec2::new(rect.left(), rect.top()),
                    );
                    field.borrow_mut().pointer_moved(local);
                })?
            });
            listeners.push({
                let field = field.clone();
                Listener::add(&events, "mouseleave", move |_| field.borrow_mut().pointer_left())?
            });
        }

        let observer = match document.document_element() {
            Some(root) if themed => {
                field.borrow_mut().apply_theme(theme::current(&root));
                let weak = Rc::downgrade(&field);
                Some(ThemeObserver::watch(root, move |theme| {
                    if let Some(field) = weak.upgrade() {
                        field.borrow_mut().apply_theme(theme);
                    }
                })?)
            }
            _ => None,
        };

        let handle = {
            let (field, surface) = (field.clone(), surface.clone());
            animation::start(Rc::new(AnimationFrames), move || {
                field.borrow_mut().frame(&mut *surface.borrow_mut())
            })
        };

        log::info!(
            "particle field started with {} particles",
            field.borrow().particles().len()
        );

        Ok(Some(Self {
            field,
            handle,
            _listeners: listeners,
            _theme: observer,
        }))
    }
}

fn options_json(options: &JsValue) -> Result<String> {
    if options.is_undefined() || options.is_null() {
        return Ok("{}".to_string());
    }
    js_sys::JSON::stringify(options)?
        .as_string()
        .ok_or_else(|| FieldError::InvalidConfig("options are not serializable".to_string()))
}

/// Handle to a particle field running on a page canvas.
#[wasm_bindgen]
pub struct ParticleCanvas {
    instance: Option<Instance>,
}

#[wasm_bindgen]
impl ParticleCanvas {
    /// Start a field from `options` layered over the hero preset. Returns
    /// `undefined` when the target surface is not on the page.
    pub fn mount(options: JsValue) -> std::result::Result<Option<ParticleCanvas>, JsValue> {
        let config = FieldConfig::from_json(&FieldConfig::default(), &options_json(&options)?)?;
        Ok(Instance::mount(config)?.map(|instance| ParticleCanvas {
            instance: Some(instance),
        }))
    }

    /// Start the standalone preset inside the container matching `selector`.
    pub fn particles(
        selector: &str,
        options: JsValue,
    ) -> std::result::Result<Option<ParticleCanvas>, JsValue> {
        let base = FieldConfig {
            surface: SurfaceTarget::Container {
                selector: selector.to_string(),
            },
            ..FieldConfig::particles()
        };
        let config = FieldConfig::from_json(&base, &options_json(&options)?)?;
        Ok(Instance::mount(config)?.map(|instance| ParticleCanvas {
            instance: Some(instance),
        }))
    }

    /// Stop the animation and detach all listeners. Idempotent.
    pub fn stop(&mut self) {
        self.instance = None;
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.instance
            .as_ref()
            .is_some_and(|i| !i.handle.is_cancelled())
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> f64 {
        self.instance
            .as_ref()
            .map_or(0.0, |i| i.handle.frames() as f64)
    }

    #[wasm_bindgen(js_name = particleCount)]
    pub fn particle_count(&self) -> usize {
        self.instance
            .as_ref()
            .map_or(0, |i| i.field.borrow().particles().len())
    }

    #[wasm_bindgen(js_name = setTheme)]
    pub fn set_theme(&self, dark: bool) {
        if let Some(instance) = &self.instance {
            let theme = if dark { Theme::Dark } else { Theme::Light };
            instance.field.borrow_mut().apply_theme(theme);
        }
    }
}

/// Mount the hero preset on `#heroCanvas` and the standalone preset on
/// `#particles-js` when the page has them.
pub fn autostart() -> Result<()> {
    let window = web_sys::window().ok_or_else(|| FieldError::Host("no window".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| FieldError::Host("no document".to_string()))?;

    let mut configs = Vec::new();
    if document.get_element_by_id("heroCanvas").is_some() {
        configs.push(FieldConfig::default());
    }
    if document.get_element_by_id("particles-js").is_some() {
        configs.push(FieldConfig::particles());
    }

    for config in configs {
        match Instance::mount(config) {
            Ok(Some(instance)) => AUTOSTARTED.with(|all| all.borrow_mut().push(instance)),
            Ok(None) => {}
            Err(e) => log::error!("could not start particle field: {e}"),
        }
    }
    Ok(())
}
