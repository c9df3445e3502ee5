//! ST7789 panel, 320×170 landscape, over SPI with DMA.

use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    Async,
    dma::{
        DmaRxBuf,
        DmaTxBuf,
    },
    dma_buffers,
    gpio::{
        Level,
        Output,
        OutputConfig,
    },
    spi::master::Spi,
    time::Rate,
};

use super::{
    BoardError,
    DisplayResources,
};
use crate::config::{
    HEIGHT,
    WIDTH,
};

type SpiInterface<'a> = mipidsi::interface::SpiInterface<
    'a,
    ExclusiveDevice<esp_hal::spi::master::SpiDmaBus<'a, Async>, Output<'a>, esp_hal::delay::Delay>,
    Output<'a>,
>;

/// The badge panel, usable as a flush target.
pub type Display<'a> = mipidsi::Display<SpiInterface<'a>, mipidsi::models::ST7789, Output<'a>>;

const DMA_BYTES: usize = 32000;

impl<'a> TryFrom<DisplayResources<'a>> for Display<'a> {
    type Error = BoardError;

    fn try_from(res: DisplayResources<'a>) -> Result<Self, BoardError> {
        let (rx_buffer, rx_descriptors, tx_buffer, tx_descriptors) = dma_buffers!(DMA_BYTES);
        let dma_rx_buf = DmaRxBuf::new(rx_descriptors, rx_buffer).map_err(|_| BoardError::Dma)?;
        let dma_tx_buf = DmaTxBuf::new(tx_descriptors, tx_buffer).map_err(|_| BoardError::Dma)?;

        let mut delay = esp_hal::delay::Delay::new();

        let dc = Output::new(res.dc, Level::Low, OutputConfig::default());
        let mut rst = Output::new(res.rst, Level::Low, OutputConfig::default());
        rst.set_high();

        let spi = Spi::new(
            res.spi,
            esp_hal::spi::master::Config::default().with_frequency(Rate::from_mhz(80)),
        )
        .map_err(|_| BoardError::Spi)?
        .with_sck(res.sck)
        .with_mosi(res.mosi)
        .with_miso(res.miso)
        .with_dma(res.dma)
        .with_buffers(dma_rx_buf, dma_tx_buf)
        .into_async();

        let cs = Output::new(res.cs, Level::High, OutputConfig::default());
        let spi_device = ExclusiveDevice::new(spi, cs, delay).map_err(|_| BoardError::Spi)?;

        let buffer = crate::mk_static!([u8; DMA_BYTES], [0_u8; DMA_BYTES]);
        let di = mipidsi::interface::SpiInterface::new(spi_device, dc, buffer);

        // The panel is mounted portrait; rotate into the 320×170 landscape
        // the renderer draws.
        mipidsi::Builder::new(mipidsi::models::ST7789, di)
            .reset_pin(rst)
            .display_size(HEIGHT as u16, WIDTH as u16)
            .invert_colors(mipidsi::options::ColorInversion::Inverted)
            .orientation(
                mipidsi::options::Orientation::new().rotate(mipidsi::options::Rotation::Deg90),
            )
            .display_offset(35, 0)
            .init(&mut delay)
            .map_err(|_| BoardError::Panel)
    }
}
