//! Browser binding: wires every widget to the page DOM.
//!
//! Built only for wasm32 with the `wasm` feature. Each widget binds to the
//! element IDs in [`crate::page::ids`]; a missing element just skips that widget.
//! Rows and history lines are written as text content, never as HTML.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlFormElement, HtmlInputElement,
    KeyboardEvent, Node,
};

use crate::autocomplete::{ClickTarget, PanelState};
use crate::carousel::{translate_x, Carousel, CarouselSurface};
use crate::clipboard::{Clipboard, CopyLinkButton};
use crate::config::WidgetConfig;
use crate::error::{Result, WidgetError};
use crate::history::RecentList;
use crate::keys::{Key, KeyAction};
use crate::page::{classes, ids, SearchBinding, SearchBox, SEARCH_BINDINGS};
use crate::scheduler::{LocalTask, Scheduler, TimerId};
use crate::store::{KeyValueStore, MemoryStore};
use crate::suggest::{HttpSuggestionSource, SuggestionSource};
use crate::theme::{Theme, ThemeSurface, ThemeToggle};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// `window.localStorage`.
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// `None` when storage is disabled (e.g. some private browsing modes).
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok().flatten()?;
        Some(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| WidgetError::Storage(format!("{e:?}")))
    }
}

/// Resolve after `delay` using `setTimeout`.
async fn sleep(delay: Duration) {
    let ms = delay.as_millis().min(i32::MAX as u128) as i32;
    let promise = Promise::new(&mut |resolve, _| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
        }
    });
    let _ = JsFuture::from(promise).await;
}

/// Timers as local tasks sleeping on `setTimeout`. Cancelling flips a flag the
/// task checks when it wakes, so a cancelled timer never runs its callback.
#[derive(Clone, Default)]
pub struct BrowserScheduler {
    live: Rc<RefCell<HashMap<TimerId, Rc<Cell<bool>>>>>,
    next_id: Rc<Cell<u64>>,
}

impl BrowserScheduler {
    fn register(&self) -> (TimerId, Rc<Cell<bool>>) {
        let id = TimerId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        let cancelled = Rc::new(Cell::new(false));
        self.live.borrow_mut().insert(id, Rc::clone(&cancelled));
        (id, cancelled)
    }
}

impl Scheduler for BrowserScheduler {
    fn after(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerId {
        let (id, cancelled) = self.register();
        let live = Rc::clone(&self.live);
        spawn_local(async move {
            sleep(delay).await;
            if cancelled.get() {
                return;
            }
            live.borrow_mut().remove(&id);
            f();
        });
        id
    }

    fn every(&self, period: Duration, mut f: Box<dyn FnMut()>) -> TimerId {
        let (id, cancelled) = self.register();
        spawn_local(async move {
            loop {
                sleep(period).await;
                if cancelled.get() {
                    break;
                }
                f();
            }
        });
        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some(flag) = self.live.borrow_mut().remove(&id) {
            flag.set(true);
        }
    }

    fn spawn(&self, task: LocalTask) {
        spawn_local(task);
    }
}

/// `navigator.clipboard.writeText`.
pub struct NavigatorClipboard;

impl Clipboard for NavigatorClipboard {
    fn write_text(&self, text: &str) -> LocalBoxFuture<'static, Result<()>> {
        let promise = web_sys::window().map(|w| w.navigator().clipboard().write_text(text));
        async move {
            let promise = promise.ok_or_else(|| WidgetError::Clipboard("no window".into()))?;
            JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|e| WidgetError::Clipboard(format!("{e:?}")))
        }
        .boxed_local()
    }
}

// ---------------------------------------------------------------------------
// Surfaces
// ---------------------------------------------------------------------------

struct DocumentTheme {
    root: Element,
}

impl ThemeSurface for DocumentTheme {
    fn apply(&self, theme: Theme) {
        let _ = self.root.set_attribute(classes::THEME_ATTR, theme.as_str());
    }

    fn current(&self) -> Option<Theme> {
        self.root
            .get_attribute(classes::THEME_ATTR)
            .and_then(|raw| raw.parse().ok())
    }
}

struct TrackSurface {
    track: HtmlElement,
    dots: Vec<Element>,
}

impl CarouselSurface for TrackSurface {
    fn first_slide_width(&self) -> Option<f64> {
        self.track
            .first_element_child()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            .map(|el| el.offset_width() as f64)
    }

    fn render(&self, offset_px: f64, active: usize) {
        let _ = self
            .track
            .style()
            .set_property("transform", &translate_x(offset_px));
        for (j, dot) in self.dots.iter().enumerate() {
            let _ = dot.class_list().toggle_with_force(classes::ACTIVE, j == active);
        }
    }
}

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

/// Attach a listener for the lifetime of the page.
fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure.forget();
}

fn element_as<T: JsCast>(doc: &Document, id: &str) -> Option<T> {
    doc.get_element_by_id(id).and_then(|el| el.dyn_into::<T>().ok())
}

fn render_panel(doc: &Document, panel: &HtmlElement, state: &PanelState) {
    panel.set_inner_html("");
    for (i, row) in state.rows.iter().enumerate() {
        let Ok(el) = doc.create_element("div") else {
            continue;
        };
        el.set_class_name(classes::SUGGESTION_ROW);
        let _ = el.set_attribute("data-row", &i.to_string());
        let _ = el.set_attribute("tabindex", "-1");
        el.set_text_content(Some(row));
        let _ = panel.append_child(&el);
    }
    let display = if state.visible { "block" } else { "none" };
    let _ = panel.style().set_property("display", display);
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

fn bind_theme(doc: &Document, store: &Rc<dyn KeyValueStore>) {
    let Some(root) = doc.document_element() else {
        return;
    };
    let toggle = ThemeToggle::init(Rc::clone(store), Rc::new(DocumentTheme { root }));
    if let Some(button) = doc.get_element_by_id(ids::THEME_TOGGLE) {
        listen(&button, "click", move |_| {
            let _ = toggle.toggle();
        });
    }
}

fn bind_search_box(
    doc: &Document,
    binding: &SearchBinding,
    source: &Rc<dyn SuggestionSource>,
    scheduler: &Rc<dyn Scheduler>,
    store: &Rc<dyn KeyValueStore>,
    config: &WidgetConfig,
) {
    let Some(input) = element_as::<HtmlInputElement>(doc, binding.input_id) else {
        return;
    };
    let panel = element_as::<HtmlElement>(doc, binding.panel_id);
    let form = element_as::<HtmlFormElement>(doc, binding.form_id);
    let search = SearchBox::new(
        binding.kind,
        Rc::clone(source),
        Rc::clone(scheduler),
        Rc::clone(store),
        config,
    );

    if let Some(panel) = panel.clone() {
        let (d, p) = (doc.clone(), panel.clone());
        search
            .autocomplete()
            .subscribe(move |state| render_panel(&d, &p, state));

        let (ac, field) = (search.autocomplete().clone(), input.clone());
        listen(&input, "input", move |_| ac.on_input(&field.value()));

        let (ac, field) = (search.autocomplete().clone(), input.clone());
        listen(&panel, "click", move |event| {
            let row = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest(&format!(".{}", classes::SUGGESTION_ROW)).ok().flatten());
            let index = row
                .and_then(|r| r.get_attribute("data-row"))
                .and_then(|v| v.parse::<usize>().ok());
            if let Some(chosen) = index.and_then(|i| ac.select(i)) {
                field.set_value(&chosen);
            }
        });

        let (ac, field, p) = (search.autocomplete().clone(), input.clone(), panel.clone());
        listen(doc, "click", move |event| {
            let node = event.target().and_then(|t| t.dyn_into::<Node>().ok());
            let target = match node.as_ref() {
                Some(n) if p.contains(Some(n)) => ClickTarget::Panel,
                Some(n) if field.is_same_node(Some(n)) => ClickTarget::Input,
                _ => ClickTarget::Outside,
            };
            ac.on_document_click(target);
        });
    }

    let Some(form) = form else {
        return;
    };

    if let Some(panel) = panel {
        let (keys, f) = (search.clone(), form.clone());
        listen(&input, "keydown", move |event| {
            let Some(key_event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            match keys.on_key(&Key::from_dom(&key_event.key())) {
                KeyAction::Submit => {
                    // One submission only: skip the browser's implicit one.
                    event.prevent_default();
                    let _ = f.request_submit();
                }
                KeyAction::FocusFirstSuggestion => {
                    let first = panel
                        .query_selector(&format!(".{}", classes::SUGGESTION_ROW))
                        .ok()
                        .flatten()
                        .and_then(|el| el.dyn_into::<HtmlElement>().ok());
                    if let Some(first) = first {
                        let _ = first.focus();
                    }
                }
                KeyAction::None => {}
            }
        });
    }

    let field = input.clone();
    listen(&form, "submit", move |_| {
        search.on_submit(&field.value(), crate::now_ms());
    });
}

fn render_recent(doc: &Document, store: &dyn KeyValueStore) {
    let Some(list) = doc.get_element_by_id(ids::RECENT_LIST) else {
        return;
    };
    list.set_inner_html("");
    for entry in RecentList::snapshot(store).entries() {
        let (Ok(li), Ok(tag)) = (doc.create_element("li"), doc.create_element("span")) else {
            continue;
        };
        li.set_class_name(classes::RECENT_ROW);
        tag.set_class_name(classes::MUTED);
        tag.set_text_content(Some(&entry.kind.to_string()));
        let _ = li.append_child(&tag);
        let _ = li.append_child(&doc.create_text_node(&format!(" {}", entry.value)));
        let _ = list.append_child(&li);
    }
}

fn bind_copy_link(doc: &Document, scheduler: &Rc<dyn Scheduler>, config: &WidgetConfig) {
    let Some(el) = doc.get_element_by_id(ids::COPY_LINK) else {
        return;
    };
    let button = CopyLinkButton::new(
        Rc::new(NavigatorClipboard),
        Rc::clone(scheduler),
        config.copy_ack(),
    );
    let label = el.clone();
    button.subscribe(move |text| label.set_text_content(Some(text)));
    listen(&el, "click", move |_| {
        let href = web_sys::window()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default();
        button.on_click(&href);
    });
}

fn bind_carousel(doc: &Document, scheduler: &Rc<dyn Scheduler>, config: &WidgetConfig) {
    let Some(track) = element_as::<HtmlElement>(doc, ids::CAROUSEL_TRACK) else {
        return;
    };
    let dots: Vec<Element> = match doc.query_selector_all(&format!(".{}", classes::CAROUSEL_DOT)) {
        Ok(list) => (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|n| n.dyn_into::<Element>().ok())
            .collect(),
        Err(_) => return,
    };
    let surface = Rc::new(TrackSurface {
        track: track.clone(),
        dots: dots.clone(),
    });
    let Some(carousel) = Carousel::new(dots.len(), surface, Rc::clone(scheduler), config) else {
        return;
    };

    for dot in &dots {
        let (c, d) = (carousel.clone(), dot.clone());
        listen(dot, "click", move |_| {
            if let Some(raw) = d.get_attribute(classes::DOT_INDEX_ATTR) {
                c.on_dot_attr(&raw);
            }
        });
    }
    let c = carousel.clone();
    listen(&track, "mouseenter", move |_| c.on_mouse_enter());
    let c = carousel.clone();
    listen(&track, "mouseleave", move |_| c.on_mouse_leave());
    carousel.start();
}

/// Module entry: bind everything present on the current page.
#[wasm_bindgen(start)]
pub fn start() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(doc) = window.document() else {
        return;
    };

    let mut config = WidgetConfig::default();
    if let Ok(origin) = window.location().origin() {
        config.base_url = origin;
    }

    let store: Rc<dyn KeyValueStore> = match LocalStorage::open() {
        Some(s) => Rc::new(s),
        None => Rc::new(MemoryStore::new()),
    };
    let scheduler: Rc<dyn Scheduler> = Rc::new(BrowserScheduler::default());

    bind_theme(&doc, &store);

    match HttpSuggestionSource::new(config.base_url.clone(), config.request_timeout()) {
        Ok(source) => {
            let source: Rc<dyn SuggestionSource> = Rc::new(source);
            for binding in &SEARCH_BINDINGS {
                bind_search_box(&doc, binding, &source, &scheduler, &store, &config);
            }
        }
        Err(e) => tracing::debug!(error = %e, "suggestion client unavailable"),
    }

    render_recent(&doc, store.as_ref());
    bind_copy_link(&doc, &scheduler, &config);
    bind_carousel(&doc, &scheduler, &config);

    console_log!("reel widgets bound to {}", config.base_url);
}
