//! One-shot hardware peripheral initialization.
//!
//! Configures the TPS ADC channel and the pulse / detector GPIO inputs
//! using raw ESP-IDF sys calls, and registers the edge ISRs.  Called once
//! from `main()` before the slow loop starts.  The IACV LEDC channel is
//! owned by `esp-idf-hal` and set up in `main()`.

#[cfg(all(target_os = "espidf", feature = "espidf"))]
use esp_idf_svc::sys::*;
#[cfg(all(target_os = "espidf", feature = "espidf"))]
use log::info;

pub use crate::error::HwInitError;
use crate::isr_glue::IsrGlue;
#[cfg(all(target_os = "espidf", feature = "espidf"))]
use crate::pins;
use crate::sensors::pulse::PulseTimer;

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the slow loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_inputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(all(target_os = "espidf", feature = "espidf"))]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// slow-loop ADC read path.
#[cfg(all(target_os = "espidf", feature = "espidf"))]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), pins::TPS_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!("hw_init: ADC1 configured (CH{}=TPS)", pins::TPS_ADC_CHANNEL);
    Ok(())
}

/// Raw 12-bit reading, or `None` if the conversion failed.
#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn adc1_read(channel: u32) -> Option<u16> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, slow-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.max(0) as u16)
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn adc1_read(_channel: u32) -> Option<u16> {
    None
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(all(target_os = "espidf", feature = "espidf"))]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let input_pins = [
        pins::WHEEL_SPEED_GPIO,
        pins::CRANK_GPIO,
        pins::BACKFIRE_SENSE_GPIO,
    ];

    for &pin in &input_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on an already-configured input.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Host: every input reads its pulled-up idle level.
#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(all(target_os = "espidf", feature = "espidf"))]
#[inline(always)]
fn isr_now_us() -> u32 {
    // SAFETY: esp_timer_get_time is a counter read; safe in ISR context.
    (unsafe { esp_timer_get_time() }) as u32
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
unsafe extern "C" fn wheel_speed_gpio_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: arg is the `&'static IsrGlue` registered in init_isr_service.
    let glue = unsafe { &*(arg as *const IsrGlue<'static>) };
    glue.wheel_speed_capture_us(isr_now_us());
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
unsafe extern "C" fn crank_gpio_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: arg is the `&'static PulseTimer` registered in init_isr_service.
    let timer = unsafe { &*(arg as *const PulseTimer) };
    timer.on_edge(isr_now_us());
}

/// Install the per-pin GPIO ISR service and register the edge handlers.
/// Call after init_peripherals() and before the slow loop.
#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub fn init_isr_service(
    glue: &'static IsrGlue<'static>,
    crank: &'static PulseTimer,
) -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service is already installed.
    // The handler arguments are 'static references, valid for the lifetime
    // of the registration; the handlers only touch atomics.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        gpio_set_intr_type(pins::WHEEL_SPEED_GPIO, gpio_int_type_t_GPIO_INTR_POSEDGE);
        let ret = gpio_isr_handler_add(
            pins::WHEEL_SPEED_GPIO,
            Some(wheel_speed_gpio_isr),
            core::ptr::from_ref(glue).cast_mut().cast(),
        );
        if ret != ESP_OK { return Err(HwInitError::IsrInstallFailed(ret)); }
        gpio_intr_enable(pins::WHEEL_SPEED_GPIO);

        gpio_set_intr_type(pins::CRANK_GPIO, gpio_int_type_t_GPIO_INTR_POSEDGE);
        let ret = gpio_isr_handler_add(
            pins::CRANK_GPIO,
            Some(crank_gpio_isr),
            core::ptr::from_ref(crank).cast_mut().cast(),
        );
        if ret != ESP_OK { return Err(HwInitError::IsrInstallFailed(ret)); }
        gpio_intr_enable(pins::CRANK_GPIO);

        info!("hw_init: ISR service installed (wheel, crank)");
    }
    Ok(())
}

#[cfg(not(all(target_os = "espidf", feature = "espidf")))]
pub fn init_isr_service(
    _glue: &'static IsrGlue<'static>,
    _crank: &'static PulseTimer,
) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
