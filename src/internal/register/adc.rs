//! ADC Register Definitions
//!
//! Register map of the S3C6410/S5PV210 TSADC block. Offsets are relative to
//! the start of the ADC register window.
//!
//! | Register  | Offset | Use in this driver                          |
//! |-----------|--------|---------------------------------------------|
//! | ADCCON    | 0x00   | control, prescaler, resolution, ECFLG       |
//! | ADCDAT0   | 0x0C   | conversion result (read starts next cycle)  |
//! | ADCCLRINT | 0x18   | write any value to clear the ADC interrupt  |
//! | ADCMUX    | 0x1C   | analog input select                         |

// =============================================================================
// Register Offsets
// =============================================================================

/// ADC Control Register offset
pub const ADCCON_OFFSET: usize = 0x00;
/// ADC Conversion Data Register offset
pub const ADCDAT0_OFFSET: usize = 0x0C;
/// ADC Interrupt Clear Register offset
pub const ADCCLRINT_OFFSET: usize = 0x18;
/// Analog Input Channel Select Register offset
pub const ADCMUX_OFFSET: usize = 0x1C;

/// Smallest window that covers every register this driver touches
pub const ADC_WINDOW_MIN_LEN: usize = ADCMUX_OFFSET + 4;

// =============================================================================
// Control Register (ADCCON) Bits
// =============================================================================

/// Enable start: starts a single conversion, cleared by hardware
pub const ADCCON_ENABLE_START: u32 = 1 << 0;
/// Read start: reading ADCDAT0 starts the next conversion
pub const ADCCON_READ_START: u32 = 1 << 1;
/// Standby mode select
pub const ADCCON_STDBM: u32 = 1 << 2;
/// Prescaler value shift
pub const ADCCON_PRSCVL_SHIFT: u32 = 6;
/// Prescaler value mask (8 bits)
pub const ADCCON_PRSCVL_MASK: u32 = 0xFF << 6;
/// Prescaler enable
pub const ADCCON_PRSCEN: u32 = 1 << 14;
/// End of conversion flag (read-only, set when conversion has finished)
pub const ADCCON_ECFLG: u32 = 1 << 15;
/// Resolution select: 0 = 10-bit, 1 = 12-bit
pub const ADCCON_RES_SEL: u32 = 1 << 16;

// =============================================================================
// Data Register (ADCDAT0) Masks
// =============================================================================

/// Data mask in 12-bit mode
pub const ADCDAT0_MASK_12BIT: u32 = 0xFFF;
/// Data mask in 10-bit mode
pub const ADCDAT0_MASK_10BIT: u32 = 0x3FF;

// =============================================================================
// Interrupt Clear / Mux
// =============================================================================

/// Value written to ADCCLRINT to acknowledge a conversion interrupt
pub const ADCCLRINT_CLEAR: u32 = 0;

/// Channel select field mask in ADCMUX
pub const ADCMUX_SEL_MASK: u32 = 0xF;
