//! Conversion between OpenSSH public keys and PEM `SubjectPublicKeyInfo` documents.
//!
//! OpenSSH public keys (`ssh-rsa AAAA... comment`) carry a base64 blob of length-prefixed fields: a 4-byte
//! big-endian length followed by that many bytes. The first field is the key type; the remaining fields are
//! big-endian integers specific to that type.
use {
    crate::{
        constants::{OID_DSA, OID_RSA_ENCRYPTION},
        crypto::md5,
        signing_key::PublicKey,
        KeyMaterial, SignatureError,
    },
    base64::{engine::general_purpose::STANDARD, Engine as _},
    log::trace,
    pkcs8::{Document, LineEnding},
    rsa::traits::PublicKeyParts,
};

const SSH_RSA: &str = "ssh-rsa";
const SSH_DSS: &str = "ssh-dss";
const PEM_PUBLIC_KEY: &str = "PUBLIC KEY";

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_NULL: u8 = 0x05;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

/// Convert an OpenSSH `ssh-rsa` or `ssh-dss` public key line into a PEM-encoded `SubjectPublicKeyInfo`.
///
/// The comment, if any, is discarded. The PEM body is wrapped at 64 columns and ends with a newline.
///
/// # Example
/// ```rust
/// # use scratchstack_http_signature::ssh_key_to_pem;
/// let err = ssh_key_to_pem("ssh-ed448 AAAACXNzaC1lZDQ0OA== me@example").unwrap_err();
/// assert_eq!(err.to_string(), "Invalid ssh key type: ssh-ed448");
/// ```
pub fn ssh_key_to_pem(key: &str) -> Result<String, SignatureError> {
    let blob = decode_blob(key)?;
    let mut reader = WireReader::new(&blob);
    let key_type = reader.next_string(key)?;

    let der = match key_type.as_str() {
        SSH_RSA => {
            let exponent = reader.next_field(key)?;
            let modulus = reader.next_field(key)?;

            let algorithm = der_sequence(&[der_oid(OID_RSA_ENCRYPTION.as_bytes()), der_tlv(TAG_NULL, &[])]);
            let rsa_key = der_sequence(&[der_integer(modulus), der_integer(exponent)]);
            der_sequence(&[algorithm, der_bit_string(&rsa_key)])
        }
        SSH_DSS => {
            let p = reader.next_field(key)?;
            let q = reader.next_field(key)?;
            let g = reader.next_field(key)?;
            let y = reader.next_field(key)?;

            let params = der_sequence(&[der_integer(p), der_integer(q), der_integer(g)]);
            let algorithm = der_sequence(&[der_oid(OID_DSA.as_bytes()), params]);
            der_sequence(&[algorithm, der_bit_string(&der_integer(y))])
        }
        _ => return Err(SignatureError::InvalidKey(format!("Invalid ssh key type: {key_type}"))),
    };

    trace!("Converted {} key to {} bytes of DER", key_type, der.len());
    let document = Document::try_from(der).map_err(|e| SignatureError::InvalidKey(format!("Invalid ssh key: {e}")))?;
    document.to_pem(PEM_PUBLIC_KEY, LineEnding::LF).map_err(|e| SignatureError::InternalServiceError(Box::new(e)))
}

/// Convert a PEM-encoded RSA key into an OpenSSH `ssh-rsa` public key line ending in ` comment`.
///
/// Public keys (`PUBLIC KEY`, `RSA PUBLIC KEY`) and private keys (from which the public key is derived) are
/// accepted. Any other key type fails with [SignatureError::InvalidKey].
pub fn pem_to_rsa_ssh_key(pem: &str, comment: &str) -> Result<String, SignatureError> {
    let PublicKey::Rsa(public_key) = KeyMaterial::pem(pem).public_key()? else {
        return Err(SignatureError::InvalidKey("key is not an RSA key".to_string()));
    };

    let mut blob = Vec::new();
    write_field(&mut blob, SSH_RSA.as_bytes());
    write_field(&mut blob, &to_signed_be(&public_key.e().to_bytes_be()));
    write_field(&mut blob, &to_signed_be(&public_key.n().to_bytes_be()));

    Ok(format!("{} {} {}", SSH_RSA, STANDARD.encode(blob), comment))
}

/// Return the OpenSSH MD5 fingerprint of a public key line as colon-separated lowercase hex octets, e.g.
/// `59:a4:61:0e:38:18:9f:0f:28:58:2a:27:f7:65:c5:87`.
pub fn fingerprint(key: &str) -> Result<String, SignatureError> {
    let blob = decode_blob(key)?;
    let digest = md5(&blob);
    Ok(digest.iter().map(|b| hex::encode([*b])).collect::<Vec<_>>().join(":"))
}

fn invalid_ssh_key(key: &str) -> SignatureError {
    SignatureError::InvalidKey(format!("Invalid ssh key: {key}"))
}

fn decode_blob(key: &str) -> Result<Vec<u8>, SignatureError> {
    let Some(encoded) = key.split_whitespace().nth(1) else {
        return Err(invalid_ssh_key(key));
    };

    STANDARD.decode(encoded).map_err(|_| invalid_ssh_key(key))
}

/// Cursor over the length-prefixed fields of an SSH public key blob.
struct WireReader<'a> {
    data: &'a [u8],
}

impl<'a> WireReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
        }
    }

    fn next_field(&mut self, key: &str) -> Result<&'a [u8], SignatureError> {
        if self.data.len() < 4 {
            return Err(invalid_ssh_key(key));
        }

        let (len, rest) = self.data.split_at(4);
        let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize;
        if rest.len() < len {
            return Err(invalid_ssh_key(key));
        }

        let (field, rest) = rest.split_at(len);
        self.data = rest;
        Ok(field)
    }

    fn next_string(&mut self, key: &str) -> Result<String, SignatureError> {
        let field = self.next_field(key)?;
        String::from_utf8(field.to_vec()).map_err(|_| invalid_ssh_key(key))
    }
}

fn write_field(out: &mut Vec<u8>, field: &[u8]) {
    out.extend_from_slice(&(field.len() as u32).to_be_bytes());
    out.extend_from_slice(field);
}

/// Render an unsigned big-endian integer as the minimal two's complement form used by both DER `INTEGER`s and SSH
/// `mpint`s.
///
/// Redundant leading zeros are removed, and a single zero byte is prepended when the most significant bit is set so
/// the value is not read back as negative. Zero is rendered as a single zero byte.
fn to_signed_be(value: &[u8]) -> Vec<u8> {
    let start = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    let value = &value[start..];

    match value.first() {
        None => vec![0],
        Some(b) if b & 0x80 != 0 => {
            let mut result = Vec::with_capacity(value.len() + 1);
            result.push(0);
            result.extend_from_slice(value);
            result
        }
        Some(_) => value.to_vec(),
    }
}

fn der_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }

    let bytes = len.to_be_bytes();
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    out.push(0x80 | (bytes.len() - start) as u8);
    out.extend_from_slice(&bytes[start..]);
}

fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 6);
    out.push(tag);
    der_length(content.len(), &mut out);
    out.extend_from_slice(content);
    out
}

fn der_integer(value: &[u8]) -> Vec<u8> {
    der_tlv(TAG_INTEGER, &to_signed_be(value))
}

fn der_oid(oid: &[u8]) -> Vec<u8> {
    der_tlv(TAG_OID, oid)
}

fn der_sequence(items: &[Vec<u8>]) -> Vec<u8> {
    der_tlv(TAG_SEQUENCE, &items.concat())
}

fn der_bit_string(content: &[u8]) -> Vec<u8> {
    // No unused bits in the final octet.
    let mut bits = Vec::with_capacity(content.len() + 1);
    bits.push(0);
    bits.extend_from_slice(content);
    der_tlv(TAG_BIT_STRING, &bits)
}
