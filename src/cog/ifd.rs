use std::io::{Read, Seek};

use tiff::decoder::ifd::Value;
use tiff::decoder::Decoder;
use tiff::tags::Tag;
use tiff::TiffResult;
use tracing::debug;

use crate::cog::geo_key_directory::GeoKeyDirectory;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const MODEL_TRANSFORMATION_TAG: u16 = 34264;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
const GEO_DOUBLE_PARAMS_TAG: u16 = 34736;
const GEO_ASCII_PARAMS_TAG: u16 = 34737;

/// NewSubfileType bits.
const FILETYPE_REDUCED_IMAGE: u32 = 0x1;
const FILETYPE_MASK: u32 = 0x4;

const PHOTOMETRIC_TRANSPARENCY_MASK: u16 = 4;

/// Every IFD of a TIFF, split by content.
pub(crate) struct ImageFileDirectories {
    image_ifds: Vec<ImageIFD>,
    mask_ifds: Vec<MaskIFD>,
}

impl ImageFileDirectories {
    /// Walks the IFD chain starting at the decoder's current image.
    pub(crate) fn read<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<Self> {
        let mut image_ifds = vec![];
        let mut mask_ifds = vec![];
        loop {
            match ImageFileDirectory::read(decoder)? {
                ImageFileDirectory::Image(image_ifd) => image_ifds.push(image_ifd),
                ImageFileDirectory::Mask(mask_ifd) => mask_ifds.push(mask_ifd),
            }
            if !decoder.more_images() {
                break;
            }
            decoder.next_image()?;
        }
        debug!(
            images = image_ifds.len(),
            masks = mask_ifds.len(),
            "scanned image file directories"
        );
        Ok(Self {
            image_ifds,
            mask_ifds,
        })
    }

    /// Splits the images into the full resolution image and its overviews.
    ///
    /// The base is the first full resolution image; overviews are the reduced
    /// resolution images following it, in file order. Further full resolution
    /// images (pages) are not part of the pyramid and are ignored.
    pub(crate) fn into_pyramid(self) -> Option<(ImageIFD, Vec<ImageIFD>)> {
        let mut images = self.image_ifds.into_iter();
        let base = images.by_ref().find(|ifd| !ifd.reduced_resolution)?;
        let overviews = images.filter(|ifd| ifd.reduced_resolution).collect();
        Some((base, overviews))
    }

    pub(crate) fn mask_count(&self) -> usize {
        self.mask_ifds.len()
    }
}

/// GeoTIFF georeferencing tags of an image.
#[derive(Clone, Debug, Default)]
pub(crate) struct GeoTags {
    pub(crate) pixel_scale: Option<Vec<f64>>,
    pub(crate) tiepoints: Option<Vec<f64>>,
    pub(crate) transformation: Option<Vec<f64>>,
    pub(crate) geo_keys: Option<GeoKeyDirectory>,
}

impl GeoTags {
    fn read<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<Self> {
        let pixel_scale = find_f64_vec(decoder, MODEL_PIXEL_SCALE_TAG)?;
        let tiepoints = find_f64_vec(decoder, MODEL_TIEPOINT_TAG)?;
        let transformation = find_f64_vec(decoder, MODEL_TRANSFORMATION_TAG)?;

        let directory = decoder.find_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY_TAG))?;
        let geo_keys = match directory {
            Some(directory) => {
                let directory = directory.into_u16_vec()?;
                let doubles = find_f64_vec(decoder, GEO_DOUBLE_PARAMS_TAG)?;
                let ascii = decoder
                    .find_tag(Tag::from_u16_exhaustive(GEO_ASCII_PARAMS_TAG))?
                    .map(Value::into_string)
                    .transpose()?;
                Some(GeoKeyDirectory::from_raw(
                    &directory,
                    doubles.as_deref(),
                    ascii.as_deref(),
                )?)
            }
            None => None,
        };

        Ok(Self {
            pixel_scale,
            tiepoints,
            transformation,
            geo_keys,
        })
    }
}

fn find_f64_vec<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    tag: u16,
) -> TiffResult<Option<Vec<f64>>> {
    decoder
        .find_tag(Tag::from_u16_exhaustive(tag))?
        .map(Value::into_f64_vec)
        .transpose()
}

/// An ImageFileDirectory representing Image content
#[derive(Clone, Debug)]
pub(crate) struct ImageIFD {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) block_width: usize,
    pub(crate) block_height: usize,
    pub(crate) reduced_resolution: bool,
    /// Only read for full resolution images.
    pub(crate) geo: Option<GeoTags>,
}

/// An ImageFileDirectory representing Mask content
#[derive(Clone, Debug)]
pub(crate) struct MaskIFD;

enum ImageFileDirectory {
    Image(ImageIFD),
    Mask(MaskIFD),
}

impl ImageFileDirectory {
    /// Reads the decoder's current IFD.
    fn read<R: Read + Seek>(decoder: &mut Decoder<R>) -> TiffResult<Self> {
        let subfile_type = decoder
            .find_tag(Tag::NewSubfileType)?
            .map(Value::into_u32)
            .transpose()?
            .unwrap_or(0);
        let reduced_resolution = subfile_type & FILETYPE_REDUCED_IMAGE != 0;

        if is_masked_ifd(decoder, subfile_type)? {
            debug!(subfile_type, "skipping mask IFD");
            return Ok(Self::Mask(MaskIFD));
        }

        let (width, height) = decoder.dimensions()?;
        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        let tiled = decoder.find_tag(Tag::TileWidth)?.is_some();
        // a strip taller than the image is one block of image height
        let chunk_height = if tiled {
            chunk_height
        } else {
            chunk_height.min(height)
        };

        let geo = if reduced_resolution {
            None
        } else {
            Some(GeoTags::read(decoder)?)
        };

        Ok(Self::Image(ImageIFD {
            width: width as usize,
            height: height as usize,
            block_width: chunk_width as usize,
            block_height: chunk_height as usize,
            reduced_resolution,
            geo,
        }))
    }
}

fn is_masked_ifd<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    subfile_type: u32,
) -> TiffResult<bool> {
    if subfile_type & FILETYPE_MASK != 0 {
        return Ok(true);
    }
    let photometric = decoder
        .find_tag(Tag::PhotometricInterpretation)?
        .map(Value::into_u16)
        .transpose()?;
    Ok(photometric == Some(PHOTOMETRIC_TRANSPARENCY_MASK))
}
