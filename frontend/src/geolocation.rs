//! Browser geolocation, delivered back to the app as a message.

use std::cell::RefCell;
use std::rc::Rc;

use seed::prelude::*;
use seed::window;
use shared::model::LatLng;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionError {
    Unsupported,
    Unavailable,
}

/// How long the browser may take and how old a cached fix may be.
#[derive(Debug, Clone, Copy)]
pub struct Fix {
    pub timeout_ms: u32,
    pub maximum_age_ms: u32,
}

/// Fresh-load recentering accepts a fix up to five minutes old.
pub const STARTUP_FIX: Fix = Fix {
    timeout_ms: 5_000,
    maximum_age_ms: 300_000,
};

pub const CURRENT_LOCATION_FIX: Fix = Fix {
    timeout_ms: 10_000,
    maximum_age_ms: 0,
};

type Respond<Ms> = Box<dyn FnOnce(Result<LatLng, PositionError>) -> Ms>;

/// Asks the browser for its position; `respond` is called exactly once.
pub fn request_position<Ms: 'static>(
    orders: &mut impl Orders<Ms>,
    fix: Fix,
    respond: impl FnOnce(Result<LatLng, PositionError>) -> Ms + 'static,
) {
    let Ok(geolocation) = window().navigator().geolocation() else {
        orders.send_msg(respond(Err(PositionError::Unsupported)));
        return;
    };

    let send = orders.msg_sender();
    let pending: RefCell<Option<Respond<Ms>>> = RefCell::new(Some(Box::new(respond)));
    let deliver: Rc<dyn Fn(Result<LatLng, PositionError>)> = Rc::new(move |result: Result<LatLng, PositionError>| {
        let respond = pending.borrow_mut().take();
        if let Some(respond) = respond {
            send(Some(respond(result)));
        }
    });

    let deliver_position = Rc::clone(&deliver);
    let on_success = Closure::once_into_js(move |position: JsValue| {
        deliver_position(coordinates(&position).ok_or(PositionError::Unavailable));
    });
    let deliver_error = Rc::clone(&deliver);
    let on_error = Closure::once_into_js(move |error: JsValue| {
        web_sys::console::debug_1(&error);
        deliver_error(Err(PositionError::Unavailable));
    });

    let options = web_sys::PositionOptions::new();
    options.set_enable_high_accuracy(true);
    options.set_timeout(fix.timeout_ms);
    options.set_maximum_age(fix.maximum_age_ms);

    if let Err(err) = geolocation.get_current_position_with_error_callback_and_options(
        on_success.unchecked_ref(),
        Some(on_error.unchecked_ref()),
        &options,
    ) {
        web_sys::console::error_1(&err);
        deliver(Err(PositionError::Unavailable));
    }
}

fn coordinates(position: &JsValue) -> Option<LatLng> {
    let coords = js_sys::Reflect::get(position, &JsValue::from_str("coords")).ok()?;
    let field = |key: &str| {
        js_sys::Reflect::get(&coords, &JsValue::from_str(key))
            .ok()?
            .as_f64()
            .filter(|value| value.is_finite())
    };
    Some(LatLng::new(field("latitude")?, field("longitude")?))
}
