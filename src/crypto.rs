use {
    crate::HashAlgorithm,
    hmac::{digest::KeyInit, Hmac, Mac},
    md5::Md5,
    sha1::Sha1,
    sha2::{Digest, Sha256, Sha512},
};

/// Wrapper function to form an HMAC over `value` using the given hash.
#[inline(always)]
pub(crate) fn hmac(hash: HashAlgorithm, key: &[u8], value: &[u8]) -> Vec<u8> {
    match hash {
        HashAlgorithm::Sha1 => hmac_with::<Hmac<Sha1>>(key, value),
        HashAlgorithm::Sha256 => hmac_with::<Hmac<Sha256>>(key, value),
        HashAlgorithm::Sha512 => hmac_with::<Hmac<Sha512>>(key, value),
    }
}

fn hmac_with<M: Mac + KeyInit>(key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut mac = <M as KeyInit>::new_from_slice(key).expect("HMAC can take a key of any size");
    mac.update(value);
    mac.finalize().into_bytes().to_vec()
}

/// Hash `value` with the given hash.
#[inline(always)]
pub(crate) fn digest(hash: HashAlgorithm, value: &[u8]) -> Vec<u8> {
    match hash {
        HashAlgorithm::Sha1 => Sha1::digest(value).to_vec(),
        HashAlgorithm::Sha256 => Sha256::digest(value).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(value).to_vec(),
    }
}

#[inline(always)]
pub(crate) fn md5(value: &[u8]) -> Vec<u8> {
    Md5::digest(value).to_vec()
}
