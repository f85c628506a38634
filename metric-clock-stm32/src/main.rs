#![no_std]
#![no_main]

mod lcd;

use embassy_executor::Spawner;
use embassy_stm32::{
    bind_interrupts,
    i2c::I2c,
    peripherals,
    time::Hertz,
    usart::{self, BufferedUart, Config as UartConfig},
};
use metric_clock_core::{
    config::Config, controller::ClockController, logging::info, millis::EmbassyMillis,
};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::lcd::I2cLcd;

const CONFIG: Config = Config::new();

bind_interrupts!(struct Irqs {
    USART2 => usart::BufferedInterruptHandler<peripherals::USART2>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_stm32::init(Default::default());

    static TX_GPS_BUF: StaticCell<[u8; 256]> = StaticCell::new();
    static RX_GPS_BUF: StaticCell<[u8; 256]> = StaticCell::new();

    let tx_gps_buf = TX_GPS_BUF.init([0u8; 256]);
    let rx_gps_buf = RX_GPS_BUF.init([0u8; 256]);

    info!("Hello World!");

    let mut uart_gps_config = UartConfig::default();
    uart_gps_config.baudrate = CONFIG.gps_baud_rate; // this must match the GPS module's baud rate

    let uart_gps = BufferedUart::new(
        p.USART2,
        Irqs,
        p.PA3, // USART2 RX pin
        p.PA2, // USART2 TX pin
        tx_gps_buf,
        rx_gps_buf,
        uart_gps_config,
    )
    .expect("failed to create UART2 for gps");

    // we never talk to the gps
    let (_uart_gps_tx, uart_gps_rx) = uart_gps.split();

    let i2c = I2c::new_blocking(p.I2C1, p.PB8, p.PB9, Hertz(100_000), Default::default());

    let mut lcd = I2cLcd::new(i2c, CONFIG.lcd_i2c_address);
    lcd.init();

    let mut clock = ClockController::new(uart_gps_rx, lcd, EmbassyMillis, &CONFIG);

    info!("starting the clock");

    // everything is polled from here. nothing else needs the executor
    clock.run()
}
