//! Bluetooth serial adapter.
//!
//! Implements [`CommandSource`] and [`LineSink`] over a Bluetooth Classic
//! Serial Port Profile (SPP) server.  A phone pairs with the advertised
//! device name, opens the serial channel, and every byte it sends is one
//! command.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid SPP server.  Controller and
//!   host stack come up through `esp_idf_svc::bt::BtDriver`; the SPP
//!   profile itself is driven through raw `esp_idf_svc::sys` calls.
//! - **all other targets**: simulation that records the bytes sent to the
//!   peer, for host-side tests.
//!
//! ## Receive path
//!
//! ```text
//!  SPP DATA_IND (BT task) ──▶ WIRELESS_RX inbox ──▶ poll_byte() (main loop)
//! ```
//!
//! The receive buffer is the shared [`Inbox`]; this adapter only reads it
//! and watches its drop counter.
//!
//! ## Pairing
//!
//! The link is unauthenticated.  Secure Simple Pairing confirmations are
//! accepted without user interaction and legacy PIN requests are answered
//! with [`legacy_pin`].

use core::fmt;

use log::{debug, info, warn};

use crate::app::events::LineEnding;
use crate::app::ports::{CommandSource, LineSink};
use crate::error::CommsError;
use crate::inbox::Inbox;

/// Service name announced in the SDP record.
#[cfg(target_os = "espidf")]
const SPP_SERVER_NAME: &core::ffi::CStr = c"SPP_SERVER";

// ───────────────────────────────────────────────────────────────
// Link state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Stack not started.
    Idle,
    /// Discoverable and waiting for a peer.
    Listening,
    /// A peer has the serial channel open.
    Connected,
    Failed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Listening => write!(f, "listening"),
            Self::Connected => write!(f, "connected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ── ESP-IDF SPP static state ──────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These statics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};

/// Handle of the open SPP connection; 0 when nobody is connected.
#[cfg(target_os = "espidf")]
static SPP_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static SPP_LISTENING: AtomicBool = AtomicBool::new(false);

#[cfg(target_os = "espidf")]
unsafe extern "C" fn spp_event_handler(
    event: esp_idf_svc::sys::esp_spp_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_spp_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    match event {
        esp_spp_cb_event_t_ESP_SPP_INIT_EVT => {
            let status = unsafe { (*param).init.status };
            if status != esp_spp_status_t_ESP_SPP_SUCCESS {
                log::error!("SPP: init failed (status={})", status);
                return;
            }
            let ret = unsafe {
                esp_spp_start_srv(
                    ESP_SPP_SEC_NONE as esp_spp_sec_t,
                    esp_spp_role_t_ESP_SPP_ROLE_SLAVE,
                    0,
                    SPP_SERVER_NAME.as_ptr(),
                )
            };
            if ret != ESP_OK as i32 {
                log::error!("SPP: start_srv failed ({})", ret);
            }
        }
        esp_spp_cb_event_t_ESP_SPP_START_EVT => {
            let status = unsafe { (*param).start.status };
            if status != esp_spp_status_t_ESP_SPP_SUCCESS {
                log::error!("SPP: server start failed (status={})", status);
                return;
            }
            unsafe {
                esp_bt_gap_set_scan_mode(
                    esp_bt_connection_mode_t_ESP_BT_CONNECTABLE,
                    esp_bt_discovery_mode_t_ESP_BT_GENERAL_DISCOVERABLE,
                );
            }
            SPP_LISTENING.store(true, AtomicOrdering::Release);
            log::info!("SPP: server listening");
        }
        esp_spp_cb_event_t_ESP_SPP_SRV_OPEN_EVT => {
            let p = unsafe { &(*param).srv_open };
            SPP_HANDLE.store(p.handle, AtomicOrdering::Release);
            log::info!("SPP: peer connected (handle={})", p.handle);
        }
        esp_spp_cb_event_t_ESP_SPP_CLOSE_EVT => {
            SPP_HANDLE.store(0, AtomicOrdering::Release);
            log::info!("SPP: peer disconnected");
        }
        esp_spp_cb_event_t_ESP_SPP_DATA_IND_EVT => {
            let p = unsafe { &(*param).data_ind };
            if p.data.is_null() || p.len == 0 {
                return;
            }
            let data = unsafe { core::slice::from_raw_parts(p.data, usize::from(p.len)) };
            crate::inbox::WIRELESS_RX.push_slice(data);
        }
        _ => {}
    }
}

/// GAP events: every pairing request is answered.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn gap_event_handler(
    event: esp_idf_svc::sys::esp_bt_gap_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_bt_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    match event {
        esp_bt_gap_cb_event_t_ESP_BT_GAP_CFM_REQ_EVT => {
            let p = unsafe { &mut (*param).cfm_req };
            log::info!("GAP: confirming passkey {:06}", p.num_val);
            let ret = unsafe { esp_bt_gap_ssp_confirm_reply(p.bda.as_mut_ptr(), true) };
            if ret != ESP_OK as i32 {
                log::warn!("GAP: ssp_confirm_reply failed ({})", ret);
            }
        }
        esp_bt_gap_cb_event_t_ESP_BT_GAP_PIN_REQ_EVT => {
            let p = unsafe { &mut (*param).pin_req };
            let (len, mut pin) = legacy_pin(p.min_16_digit);
            let ret =
                unsafe { esp_bt_gap_pin_reply(p.bda.as_mut_ptr(), true, len, pin.as_mut_ptr()) };
            if ret != ESP_OK as i32 {
                log::warn!("GAP: pin_reply failed ({})", ret);
            }
        }
        esp_bt_gap_cb_event_t_ESP_BT_GAP_KEY_NOTIF_EVT => {
            let passkey = unsafe { (*param).key_notif.passkey };
            log::info!("GAP: passkey {:06}", passkey);
        }
        esp_bt_gap_cb_event_t_ESP_BT_GAP_AUTH_CMPL_EVT => {
            let stat = unsafe { (*param).auth_cmpl.stat };
            if stat == esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::info!("GAP: paired");
            } else {
                log::warn!("GAP: pairing failed (status={})", stat);
            }
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
fn esp_check(what: &str, ret: esp_idf_svc::sys::esp_err_t) -> Result<(), CommsError> {
    if ret != esp_idf_svc::sys::ESP_OK as i32 {
        log::error!("BT: {} failed ({})", what, ret);
        return Err(CommsError::BtInitFailed(ret));
    }
    Ok(())
}

/// PIN for a legacy pairing request, as `(length, code)`.  A peer that
/// insists on a 16-digit code gets sixteen zeros, anyone else `1234`.
pub fn legacy_pin(min_16_digit: bool) -> (u8, [u8; 16]) {
    let mut code = [0u8; 16];
    if min_16_digit {
        return (16, code);
    }
    code[..4].copy_from_slice(b"1234");
    (4, code)
}

// ───────────────────────────────────────────────────────────────
// Bluetooth serial adapter
// ───────────────────────────────────────────────────────────────

pub struct BtSerialAdapter {
    device_name: String,
    state: LinkState,
    rx: &'static Inbox,
    /// Drop counter value at the last [`take_new_drops`](Self::take_new_drops).
    drops_seen: u32,
    /// Owns the controller and Bluedroid; dropping it tears the stack down.
    #[cfg(target_os = "espidf")]
    _driver: Option<esp_idf_svc::bt::BtDriver<'static, esp_idf_svc::bt::Classic>>,
    /// Simulation: whether a fake peer is attached.
    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
    /// Simulation: every byte delivered to the peer, terminators included.
    #[cfg(not(target_os = "espidf"))]
    sim_wire: Vec<u8>,
}

impl BtSerialAdapter {
    pub fn new(device_name: &str, rx: &'static Inbox) -> Self {
        Self {
            device_name: device_name.to_owned(),
            state: LinkState::Idle,
            rx,
            drops_seen: rx.dropped(),
            #[cfg(target_os = "espidf")]
            _driver: None,
            #[cfg(not(target_os = "espidf"))]
            sim_connected: false,
            #[cfg(not(target_os = "espidf"))]
            sim_wire: Vec::new(),
        }
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn state(&self) -> LinkState {
        self.refresh_state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    /// The inbox the SPP callback fills.
    pub fn commands(&self) -> &'static Inbox {
        self.rx
    }

    /// Bytes lost to a full inbox since the previous call, if any.
    pub fn take_new_drops(&mut self) -> Option<u32> {
        let total = self.rx.dropped();
        let new = total.wrapping_sub(self.drops_seen);
        self.drops_seen = total;
        (new > 0).then_some(new)
    }

    /// Send one line followed by `ending`, in a single SPP write.
    pub fn send_line(&mut self, line: &str, ending: LineEnding) -> Result<(), CommsError> {
        if !self.is_connected() {
            return Err(CommsError::NotConnected);
        }
        let ending = ending.as_str();
        let mut frame = Vec::with_capacity(line.len() + ending.len());
        frame.extend_from_slice(line.as_bytes());
        frame.extend_from_slice(ending.as_bytes());
        self.platform_write(&mut frame)
    }

    // ── Platform-specific ─────────────────────────────────────

    /// Bring up the controller in Classic mode, register the SPP server
    /// and become discoverable under `device_name`.
    #[cfg(target_os = "espidf")]
    pub fn start(
        &mut self,
        modem: esp_idf_svc::hal::modem::Modem,
        nvs: esp_idf_svc::nvs::EspDefaultNvsPartition,
    ) -> Result<(), CommsError> {
        use esp_idf_svc::bt::{BtDriver, Classic};
        use esp_idf_svc::sys::*;

        let driver = BtDriver::<Classic>::new(modem, Some(nvs)).map_err(|e| {
            self.state = LinkState::Failed;
            CommsError::BtInitFailed(e.code())
        })?;
        self._driver = Some(driver);

        let name = std::ffi::CString::new(self.device_name.as_str()).map_err(|_| {
            self.state = LinkState::Failed;
            CommsError::BtInitFailed(ESP_ERR_INVALID_ARG as i32)
        })?;

        let cfg = esp_spp_cfg_t {
            mode: esp_spp_mode_t_ESP_SPP_MODE_CB,
            enable_l2cap_ertm: true,
            tx_buffer_size: 0,
        };

        let result = esp_check("set_device_name", unsafe {
            esp_bt_gap_set_device_name(name.as_ptr())
        })
        .and_then(|()| {
            esp_check("gap_register_callback", unsafe {
                esp_bt_gap_register_callback(Some(gap_event_handler))
            })
        })
        .and_then(|()| {
            esp_check("spp_register_callback", unsafe {
                esp_spp_register_callback(Some(spp_event_handler))
            })
        })
        .and_then(|()| esp_check("spp_enhanced_init", unsafe { esp_spp_enhanced_init(&cfg) }));
        if let Err(e) = result {
            self.state = LinkState::Failed;
            return Err(e);
        }

        self.state = LinkState::Listening;
        info!("BT(espidf): SPP server up as '{}'", self.device_name);
        Ok(())
    }

    /// Simulation: there is no radio; the link is immediately listening.
    #[cfg(not(target_os = "espidf"))]
    pub fn start(&mut self) -> Result<(), CommsError> {
        self.state = LinkState::Listening;
        info!("BT(sim): SPP server up as '{}'", self.device_name);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn refresh_state(&self) -> LinkState {
        match self.state {
            LinkState::Idle | LinkState::Failed => self.state,
            _ if SPP_HANDLE.load(AtomicOrdering::Acquire) != 0 => LinkState::Connected,
            _ if SPP_LISTENING.load(AtomicOrdering::Acquire) => LinkState::Listening,
            _ => self.state,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn refresh_state(&self) -> LinkState {
        match self.state {
            LinkState::Listening | LinkState::Connected if self.sim_connected => {
                LinkState::Connected
            }
            LinkState::Connected => LinkState::Listening,
            other => other,
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_write(&mut self, frame: &mut [u8]) -> Result<(), CommsError> {
        use esp_idf_svc::sys::*;
        let handle = SPP_HANDLE.load(AtomicOrdering::Acquire);
        if handle == 0 {
            return Err(CommsError::NotConnected);
        }
        let ret = unsafe { esp_spp_write(handle, frame.len() as i32, frame.as_mut_ptr()) };
        if ret != ESP_OK as i32 {
            return Err(CommsError::WriteFailed(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_write(&mut self, frame: &mut [u8]) -> Result<(), CommsError> {
        self.sim_wire.extend_from_slice(frame);
        Ok(())
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Simulation: attach or detach the fake peer.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_connected(&mut self, connected: bool) {
        self.sim_connected = connected;
        self.state = self.refresh_state();
    }

    /// Simulation: raw bytes the peer has received so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_wire(&self) -> &[u8] {
        &self.sim_wire
    }
}

// ───────────────────────────────────────────────────────────────
// Port implementations
// ───────────────────────────────────────────────────────────────

impl CommandSource for BtSerialAdapter {
    fn poll_byte(&mut self) -> Option<u8> {
        self.rx.pop()
    }
}

impl LineSink for BtSerialAdapter {
    fn write_line(&mut self, line: &str, ending: LineEnding) {
        match self.send_line(line, ending) {
            Ok(()) => {}
            Err(CommsError::NotConnected) => debug!("BT: no peer, line not sent"),
            Err(e) => warn!("BT: {}", e),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
