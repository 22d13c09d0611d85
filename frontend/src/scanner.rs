use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::HtmlVideoElement;
use yew::Callback;

#[wasm_bindgen]
extern "C" {
    /// `QrScanner` global from the qr-scanner UMD bundle loaded by index.html.
    type QrScanner;

    #[wasm_bindgen(constructor, catch)]
    fn new(
        video: &HtmlVideoElement,
        on_decode: &Function,
        options: &JsValue,
    ) -> Result<QrScanner, JsValue>;

    #[wasm_bindgen(method)]
    fn start(this: &QrScanner) -> Promise;

    #[wasm_bindgen(method)]
    fn stop(this: &QrScanner);

    #[wasm_bindgen(method)]
    fn destroy(this: &QrScanner);
}

/// Live camera scanner bound to a `<video>` element.
///
/// Owns the camera stream: dropping it stops and disposes the scanner, so the
/// component releases the camera simply by clearing its `Option<Scanner>`.
pub struct Scanner {
    inner: QrScanner,
    _on_decode: Closure<dyn FnMut(JsValue)>,
    _on_error: Closure<dyn FnMut(JsValue)>,
}

impl Scanner {
    pub fn start(
        video: &HtmlVideoElement,
        on_decode: Callback<String>,
        on_error: Callback<String>,
    ) -> Result<Self, JsValue> {
        let decode = Closure::<dyn FnMut(JsValue)>::new(move |result: JsValue| {
            let data = Reflect::get(&result, &JsValue::from_str("data"))
                .ok()
                .and_then(|v| v.as_string())
                .or_else(|| result.as_string());
            if let Some(data) = data {
                on_decode.emit(data);
            }
        });
        let error = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
            on_error.emit(describe_error(&err));
        });

        let options = Object::new();
        Reflect::set(&options, &JsValue::from_str("onDecodeError"), error.as_ref())?;
        Reflect::set(
            &options,
            &JsValue::from_str("preferredCamera"),
            &JsValue::from_str("environment"),
        )?;
        Reflect::set(&options, &JsValue::from_str("highlightScanRegion"), &JsValue::TRUE)?;
        Reflect::set(&options, &JsValue::from_str("highlightCodeOutline"), &JsValue::TRUE)?;
        Reflect::set(&options, &JsValue::from_str("returnDetailedScanResult"), &JsValue::TRUE)?;

        let inner = QrScanner::new(video, decode.as_ref().unchecked_ref(), &options)?;
        let scanner = Self {
            inner,
            _on_decode: decode,
            _on_error: error,
        };
        scanner.run();
        Ok(scanner)
    }

    fn run(&self) {
        let started = JsFuture::from(self.inner.start());
        spawn_local(async move {
            match started.await {
                Ok(_) => log::info!("QR scanner started successfully"),
                Err(e) => log::error!("Failed to start QR scanner: {:?}", e),
            }
        });
    }

    pub fn restart(&self) {
        self.inner.stop();
        self.run();
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.inner.stop();
        self.inner.destroy();
        log::info!("QR scanner released");
    }
}

// qr-scanner reports "No QR code found" as a plain string and camera problems
// as DOMException objects.
fn describe_error(err: &JsValue) -> String {
    if let Some(message) = err.as_string() {
        return message;
    }
    ["name", "message"]
        .iter()
        .find_map(|key| {
            Reflect::get(err, &JsValue::from_str(key))
                .ok()
                .and_then(|v| v.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", err))
}
